use anyhow::Result;
use log::info;
use std::path::PathBuf;

/// Validate .rpd container integrity
pub fn run(file: PathBuf) -> Result<()> {
    use rpd::validator::validate_rpd_file;

    info!("rpd Validator");
    info!("File: {}", file.display());

    match validate_rpd_file(&file) {
        Ok(report) => {
            println!("{}", report.format_colored());

            // Exit with error code if validation failed
            if report.has_failures() {
                std::process::exit(1);
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("Validation error: {}", e);
            std::process::exit(1);
        }
    }
}
