//! Build script that compiles the C side of the layout contract.
//!
//! `bridge_probe.c` includes the generated `struct_bridge_layout.h`, so the
//! C compiler sees exactly the declarations the Rust descriptors describe.

fn main() {
    println!("cargo:rerun-if-changed=c_src/bridge_probe.c");
    println!("cargo:rerun-if-changed=c_src/struct_bridge.h");
    println!("cargo:rerun-if-changed=c_src/struct_bridge_layout.h");

    cc::Build::new()
        .file("c_src/bridge_probe.c")
        .include("c_src")
        .warnings(true)
        .compile("bridge_probe");
}
