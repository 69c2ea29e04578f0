//! Build script for readers-service
//!
//! The Postgres migrations are embedded at compile time, so a changed
//! migration must trigger a rebuild.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/db/repositories/postgres/migrations");
}
