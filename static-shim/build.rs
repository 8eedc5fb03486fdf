fn main() {
    // Target and working directory are baked in through option_env!.
    println!("cargo:rerun-if-env-changed=SHIM_EXE");
    println!("cargo:rerun-if-env-changed=SHIM_WD");
}
