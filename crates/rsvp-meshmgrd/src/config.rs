//! Command line configuration of a reconciliation run

use clap::Parser;
use rsvp_mesh_common::{MeshError, MeshResult};

use crate::types::{MeshParams, Protocol};

/// Keep an RSVP-TE LSP mesh toward IGP loopbacks in sync with the routing table
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rsvp-meshmgrd")]
#[command(author, version, about, long_about = None)]
pub struct MeshConfig {
    /// Routing protocol providing the /32 destinations
    #[arg(short = 'p', long, value_enum)]
    pub protocol: Protocol,

    /// Number of parallel LSPs per destination
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Minutes to keep LSPs toward destinations that disappeared
    #[arg(short = 't', long)]
    pub timeout: u64,

    /// Prefix-list restricting the destinations
    #[arg(long, alias = "prefix_list")]
    pub prefix_list: String,

    /// Prefix of the LSP names
    #[arg(long)]
    pub prefix: String,

    /// Name of the tunnel used as LSP configuration template
    #[arg(long)]
    pub template: String,
}

impl MeshConfig {
    /// Checks the values clap cannot check on its own.
    ///
    /// Names end up inside configuration statements, so they must be
    /// single non-empty words.
    pub fn validate(&self) -> MeshResult<()> {
        for (field, value) in [
            ("prefix-list", &self.prefix_list),
            ("prefix", &self.prefix),
            ("template", &self.template),
        ] {
            if value.is_empty() {
                return Err(MeshError::invalid_config(field, "must not be empty"));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(MeshError::invalid_config(
                    field,
                    format!("must not contain whitespace: '{}'", value),
                ));
            }
        }
        Ok(())
    }

    /// Reconciliation parameters, completed with the template statements
    /// read from the device.
    pub fn params(&self, template: Vec<String>) -> MeshParams {
        MeshParams::new(self.prefix.clone(), self.count, self.timeout).with_template(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<MeshConfig, clap::Error> {
        MeshConfig::try_parse_from(std::iter::once("rsvp-meshmgrd").chain(args.iter().copied()))
    }

    const FULL: &[&str] = &[
        "-p",
        "isis",
        "-c",
        "2",
        "-t",
        "60",
        "--prefix-list",
        "LOOPBACKS",
        "--prefix",
        "LSP",
        "--template",
        "TEMPLATE",
    ];

    #[test]
    fn test_parse_full() {
        let config = parse(FULL).unwrap();
        assert_eq!(config.protocol, Protocol::Isis);
        assert_eq!(config.count, 2);
        assert_eq!(config.timeout, 60);
        assert_eq!(config.prefix_list, "LOOPBACKS");
        assert_eq!(config.prefix, "LSP");
        assert_eq!(config.template, "TEMPLATE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_long_names_and_alias() {
        let config = parse(&[
            "--protocol",
            "ospf",
            "--count",
            "1",
            "--timeout",
            "0",
            "--prefix_list",
            "PL",
            "--prefix",
            "MESH",
            "--template",
            "T",
        ])
        .unwrap();
        assert_eq!(config.protocol, Protocol::Ospf);
        assert_eq!(config.timeout, 0);
        assert_eq!(config.prefix_list, "PL");
    }

    #[test]
    fn test_missing_option_rejected() {
        for skip in (0..FULL.len()).step_by(2) {
            let args: Vec<&str> = FULL
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip && *i != skip + 1)
                .map(|(_, a)| *a)
                .collect();
            assert!(parse(&args).is_err(), "accepted without {}", FULL[skip]);
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut args = FULL.to_vec();
        args[1] = "bgp";
        assert!(parse(&args).is_err());

        let mut args = FULL.to_vec();
        args[3] = "0";
        assert!(parse(&args).is_err());

        let mut args = FULL.to_vec();
        args[5] = "-5";
        assert!(parse(&args).is_err());
    }

    #[test]
    fn test_validate_names() {
        let mut config = parse(FULL).unwrap();
        config.prefix = "L SP".to_string();
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = parse(FULL).unwrap();
        config.template = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_params() {
        let config = parse(FULL).unwrap();
        let params = config.params(vec!["bandwidth auto".to_string()]);
        assert_eq!(params.prefix, "LSP");
        assert_eq!(params.count, 2);
        assert_eq!(params.timeout_minutes, 60);
        assert_eq!(params.template, vec!["bandwidth auto".to_string()]);
    }
}
