//! Writing rendered configs for several outputs.

use crate::fs_utils;
use crate::output::{OptionsBag, OutputSpec};
use crate::utils::config_file_name;
use std::io;
use std::path::{Path, PathBuf};

/// Render every elasticsearch output into `<output_dir>/<snake_name>.conf`
///
/// Outputs of other types are skipped. Returns the written paths in output
/// order.
pub fn generate_all(
    outputs: &[OutputSpec],
    options: &OptionsBag,
    output_dir: &Path,
) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for output in outputs {
        if !output.is_elasticsearch() {
            tracing::info!(output = %output.name, output_type = %output.output_type, "skipping non-elasticsearch output");
            continue;
        }

        let path = output_dir.join(config_file_name(&output.name));
        fs_utils::write_file(&path, crate::generate(output, options))?;
        println!("  ✓ Generated {}", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_all_skips_other_types() {
        let dir = tempfile::tempdir().unwrap();
        let mut syslog = OutputSpec::elasticsearch("remote-syslog", None);
        syslog.output_type = "syslog".to_string();
        let outputs = vec![OutputSpec::elasticsearch("DefaultES", None), syslog];

        let written = generate_all(&outputs, &OptionsBag::new(), dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("default_es.conf")]);

        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("@type viaq_data_model"));
        assert!(!dir.path().join("remote_syslog.conf").exists());
    }
}
