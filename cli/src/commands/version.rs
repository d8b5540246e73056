//! Version command

/// Run the version command.
pub fn run() {
    println!("tierup {}", env!("CARGO_PKG_VERSION"));
}
