use std::env;

const PATH_TO_LINKER_SCRIPT: &str = "linker.ld";

fn main() -> Result<(), String> {
    let path = env::current_dir()
        .map_err(|err| format!("Unable to access project directory: {err}"))?
        .into_os_string()
        .into_string()
        .map_err(|err| {
            format!(
                "Project directory path is not valid unicode (approximately {})",
                err.to_string_lossy()
            )
        })?;

    println!(
        "cargo:rustc-link-arg-bin=kernel=--script={}/{}",
        path, PATH_TO_LINKER_SCRIPT
    );
    println!("cargo:rustc-link-arg-bin=kernel=-n");
    println!("cargo:rerun-if-changed={}", PATH_TO_LINKER_SCRIPT);

    Ok(())
}
