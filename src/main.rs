//! softnav binary entry point.

fn main() {
    if let Err(e) = softnav::cli::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
