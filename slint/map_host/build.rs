fn main() {
    slint_build::compile("ui/map_host.slint").expect("failed to compile map_host.slint");
    println!("cargo:rerun-if-changed=ui/map_host.slint");
}
