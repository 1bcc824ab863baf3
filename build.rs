//! This build script generates the compiled-in allow-list of hosts whose certificate
//! errors the interceptor is permitted to override.
//!
//! By default the list only contains the application host. Enabling the
//! `broad-allow-list` feature adds its parent domain as well.
//!
//! When `WEBVIEW_TRUST_ALLOWED_HOSTS` is set, its comma separated entries replace the
//! list entirely. This is still a compile-time setting: nothing here can be changed
//! once the library is built.

use std::env;
use std::fs;
use std::path::PathBuf;

const ALLOWED_HOSTS_VAR: &str = "WEBVIEW_TRUST_ALLOWED_HOSTS";

const APPLICATION_HOST: &str = "cliente.solucnet.com";
const PARENT_DOMAIN: &str = "solucnet.com";

fn main() {
    // Always rerun this script if the variable changed, regardless of the output files.
    println!("cargo:rerun-if-env-changed={}", ALLOWED_HOSTS_VAR);
    println!("cargo:rerun-if-changed=build.rs");

    let hosts: Vec<String> = match env::var(ALLOWED_HOSTS_VAR) {
        Ok(list) => list
            .split(',')
            .map(|entry| entry.trim().to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect(),
        Err(_) => {
            let mut hosts = vec![APPLICATION_HOST.to_owned()];
            if env::var_os("CARGO_FEATURE_BROAD_ALLOW_LIST").is_some() {
                hosts.push(PARENT_DOMAIN.to_owned());
            }
            hosts
        }
    };

    for host in &hosts {
        if host.contains("://") || host.contains('/') || host.contains(char::is_whitespace) {
            panic!("{ALLOWED_HOSTS_VAR} entry {host:?} must be a bare host name");
        }
    }

    let entries: Vec<String> = hosts.iter().map(|host| format!("    {host:?},\n")).collect();
    let source = format!(
        "/// Hosts compiled into this build of the library.\npub(crate) const COMPILED_ALLOW_LIST: &[&str] = &[\n{}];\n",
        entries.concat()
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("allow_list.rs"), source).unwrap();
}
