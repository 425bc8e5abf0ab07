//! FILENAME: app/src/main.rs
// PURPOSE: Desktop entry point.

fn main() {
    app_lib::run();
}
