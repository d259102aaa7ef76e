//! bootpy-admin binary: inspect, provision and clean the environment without delegating.

fn main() {
    if let Err(e) = bootpy::run_admin() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
