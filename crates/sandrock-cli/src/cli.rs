use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sandrock_core::{LanguageCode, LengthPrefix, ToolConfig};

use crate::commands::hex_utils::{parse_byte, parse_offset};

/// sandrock - patch translated text into fixed-size localization tables
#[derive(Debug, Parser)]
#[command(name = "sandrock", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Args)]
pub struct GlobalOptions {
    /// Config file (default: sandrock.toml in the working directory, if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// First byte of the localization sector (decimal or 0x hex)
    #[arg(long, global = true, value_parser = parse_offset, value_name = "OFFSET")]
    pub first_byte: Option<usize>,

    /// Last byte of the localization sector, inclusive
    #[arg(long, global = true, value_parser = parse_offset, value_name = "OFFSET")]
    pub last_byte: Option<usize>,

    /// Text encoding label (utf-8, shift_jis, windows-1252, ...)
    #[arg(long, global = true)]
    pub encoding: Option<String>,

    /// Padding byte written after shorter replacements
    #[arg(long, global = true, value_parser = parse_byte, value_name = "BYTE")]
    pub fill_byte: Option<u8>,

    /// Source language, or "auto"
    #[arg(long, global = true, env = "SANDROCK_SOURCE", value_name = "LANG")]
    pub source: Option<LanguageCode>,

    /// Target language
    #[arg(long, global = true, env = "SANDROCK_TARGET", value_name = "LANG")]
    pub target: Option<LanguageCode>,

    /// Concurrent translation requests
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Fail instead of truncating replacements that don't fit
    #[arg(long, global = true)]
    pub strict: bool,

    /// Rewrite each changed record's length field
    #[arg(long, global = true)]
    pub sync_length: bool,

    /// Write the run report as JSON
    #[arg(long, global = true, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Enable debug-level logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalOptions {
    /// Config file values overridden by command line flags
    pub fn resolve_config(&self) -> Result<ToolConfig> {
        let base = ToolConfig::load_or_default(self.config.as_deref())?;

        let mut builder = ToolConfig::builder();
        if let Some(v) = self.first_byte {
            builder = builder.first_byte(v);
        }
        if let Some(v) = self.last_byte {
            builder = builder.last_byte(v);
        }
        if let Some(v) = &self.encoding {
            builder = builder.encoding(v.clone());
        }
        if let Some(v) = self.fill_byte {
            builder = builder.fill_byte(v);
        }
        if let Some(v) = &self.source {
            builder = builder.source(v.clone());
        }
        if let Some(v) = &self.target {
            builder = builder.target(v.clone());
        }
        if let Some(v) = self.workers {
            builder = builder.workers(v);
        }
        if self.strict {
            builder = builder.strict(true);
        }
        if self.sync_length {
            builder = builder.length_prefix(LengthPrefix::Sync);
        }

        let config = builder.build_on(base);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the slot table as an editable JSON mapping.
    ///
    /// With --target, translations are pre-filled by machine translation.
    Export {
        /// Localization binary to read
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Mapping file to write
        #[arg(value_name = "MAPPING")]
        mapping: PathBuf,
    },

    /// Machine-translate every slot and write the patched binary.
    Translate {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Apply a mapping file, or text from another copy of the binary.
    Patch {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Mapping file with translations
        #[arg(long, value_name = "FILE", required_unless_present = "from_binary")]
        mapping: Option<PathBuf>,

        /// Take text from this binary, matched by record id
        #[arg(long, value_name = "FILE", conflicts_with = "mapping")]
        from_binary: Option<PathBuf>,

        /// Sector start in the --from-binary file (default: same as input)
        #[arg(long, value_parser = parse_offset, requires = "from_binary", value_name = "OFFSET")]
        from_first_byte: Option<usize>,

        /// Sector end in the --from-binary file, inclusive
        #[arg(long, value_parser = parse_offset, requires = "from_binary", value_name = "OFFSET")]
        from_last_byte: Option<usize>,
    },

    /// Summarize the slot table of a binary.
    Inspect {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// List every slot
        #[arg(long)]
        slots: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from(["sandrock", "export", "in.dat", "map.json"]).unwrap();
        assert!(matches!(cli.command, Command::Export { .. }));
        assert!(!cli.global.strict);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sandrock",
            "translate",
            "in.dat",
            "out.dat",
            "--target",
            "de",
            "--first-byte",
            "0x10",
            "--strict",
        ])
        .unwrap();
        assert_eq!(cli.global.target.unwrap().as_str(), "de");
        assert_eq!(cli.global.first_byte, Some(16));
        assert!(cli.global.strict);
    }

    #[test]
    fn test_invalid_language_rejected() {
        let result =
            Cli::try_parse_from(["sandrock", "translate", "a", "b", "--target", "german"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_needs_a_source() {
        assert!(Cli::try_parse_from(["sandrock", "patch", "a", "b"]).is_err());
        assert!(
            Cli::try_parse_from([
                "sandrock",
                "patch",
                "a",
                "b",
                "--mapping",
                "m.json",
                "--from-binary",
                "c"
            ])
            .is_err()
        );
        assert!(
            Cli::try_parse_from(["sandrock", "patch", "a", "b", "--from-first-byte", "4"])
                .is_err()
        );
    }

    #[test]
    fn test_patch_from_binary() {
        let cli = Cli::try_parse_from([
            "sandrock",
            "patch",
            "a",
            "b",
            "--from-binary",
            "old.dat",
            "--from-first-byte",
            "92000",
        ])
        .unwrap();
        match cli.command {
            Command::Patch {
                from_binary,
                from_first_byte,
                mapping,
                ..
            } => {
                assert_eq!(from_binary, Some(PathBuf::from("old.dat")));
                assert_eq!(from_first_byte, Some(92000));
                assert!(mapping.is_none());
            }
            _ => panic!("expected patch command"),
        }
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sandrock.toml");
        std::fs::write(&path, "[sector]\nfirst_byte = 8\nlast_byte = 99\n").unwrap();

        let cli = Cli::try_parse_from([
            "sandrock",
            "inspect",
            "in.dat",
            "--config",
            path.to_str().unwrap(),
            "--last-byte",
            "63",
            "--sync-length",
        ])
        .unwrap();
        let config = cli.global.resolve_config().unwrap();
        assert_eq!(config.sector.first_byte, 8);
        assert_eq!(config.sector.last_byte, 63);
        assert_eq!(config.patch.length_prefix, LengthPrefix::Sync);
    }
}
