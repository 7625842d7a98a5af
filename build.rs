use std::io::{Error, ErrorKind};
use std::process::Command;

fn main() {
    let package_version =
        option_env!("CARGO_PKG_VERSION").unwrap_or("(Unknown Cargo package version)");

    // Obtain build infomation from Git.
    let build_info = from_git().unwrap_or_else(|_| "(Build info from Git not present)".into());

    println!("cargo:rustc-env=FOLIO_VERSION={}", package_version);
    println!("cargo:rustc-env=BUILD_INFO={}", build_info);
}

fn run(args: &[&str]) -> Result<String, Error> {
    let out = Command::new(args[0]).args(&args[1..]).output()?;
    if out.status.success() {
        String::from_utf8(out.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|err| Error::new(ErrorKind::InvalidData, err))
    } else {
        Err(Error::new(ErrorKind::Other, "Command not successful."))
    }
}

fn from_git() -> Result<String, Error> {
    let rev = run(&["git", "rev-parse", "--verify", "--short", "HEAD"])?;
    let branch = run(&["git", "rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(format!("{} ({})", rev, branch))
}
