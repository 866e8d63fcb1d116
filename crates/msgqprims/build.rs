fn main() {
    for (var, name) in [("TARGET", "TARGET"), ("PROFILE", "PROFILE")] {
        if let Ok(value) = std::env::var(var) {
            println!("cargo:rustc-env=MSGQPRIMS_BUILD_{name}={value}");
        }
        println!("cargo:rerun-if-env-changed={var}");
    }
}
