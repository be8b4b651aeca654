// Ciphersweep build script
// Records build-time platform information exposed through the banner.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Target platform, shown in the version banner
    let target = env::var("TARGET").unwrap();
    println!("cargo:rustc-env=CIPHERSWEEP_TARGET={}", target);

    if let Ok(profile) = env::var("PROFILE") {
        if profile == "release" {
            println!("cargo:rustc-env=CIPHERSWEEP_OPTIMIZED=true");
        }
    }
}
