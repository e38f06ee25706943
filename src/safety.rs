//! Safety checks to prevent a run from overwriting its own inputs.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output file must have a `.csv` extension
/// - Output cannot be the same as any of the provided input paths
///   (karaoke catalog, provider caches)
///
/// # Arguments
/// * `output` - The CSV path that will be created/overwritten
/// * `input_paths` - Every file read during the run
pub fn validate_output_path(output: &Path, input_paths: &[&Path]) -> Result<()> {
    let is_csv = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        bail!(
            "Safety check failed: output file '{}' must have a .csv extension",
            output.display()
        );
    }

    for input in input_paths {
        if output == *input {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                input.display()
            );
        }
        // Catch differently spelled paths to the same existing file
        if let (Ok(a), Ok(b)) = (output.canonicalize(), input.canonicalize()) {
            if a == b {
                bail!(
                    "Safety check failed: output '{}' resolves to input '{}'",
                    output.display(),
                    input.display()
                );
            }
        }
    }

    Ok(())
}
