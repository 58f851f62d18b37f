use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::reconcile::{NavigationContext, StorageTable};

#[derive(Parser, Debug)]
#[command(name = "vinscan")]
#[command(about = "Capture, decode and place vehicles by identification code")]
pub struct Cli {
    /// Directory holding the vehicle database and settings.json.
    #[arg(long, global = true, env = "VINSCAN_DATA_DIR", default_value = ".vinscan")]
    pub data_dir: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a code through the camera pipeline and place the vehicle.
    Scan {
        /// Extra still image to use as a rear camera, ahead of configured devices.
        #[arg(long)]
        image: Option<PathBuf>,
        #[command(flatten)]
        placement: PlacementArgs,
    },
    /// Place a vehicle from a typed code.
    Manual {
        code: String,
        #[command(flatten)]
        placement: PlacementArgs,
    },
    /// Validate a code and print the advisory decode without storing anything.
    Decode { code: String },
    /// Print the stored record for a code with its move history.
    Show { code: String },
    /// List stored vehicles, optionally for one storage table.
    List {
        #[arg(long, value_enum)]
        table: Option<ViewArg>,
    },
    /// Print the effective settings.
    Config {
        /// Write the effective settings to settings.json for editing.
        #[arg(long, default_value_t = false)]
        write_defaults: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Inventory,
    Showroom,
    Garage,
}

impl From<ViewArg> for StorageTable {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Inventory => StorageTable::Inventory,
            ViewArg::Showroom => StorageTable::Showroom,
            ViewArg::Garage => StorageTable::Garage,
        }
    }
}

/// Where the operator is standing when the vehicle is scanned.
#[derive(Args, Debug, Clone)]
pub struct PlacementArgs {
    #[arg(long, value_enum, default_value_t = ViewArg::Inventory)]
    pub view: ViewArg,
    /// Inventory location label.
    #[arg(long)]
    pub location: Option<String>,
    /// Showroom floor label.
    #[arg(long, required_if_eq("view", "showroom"))]
    pub floor: Option<String>,
    /// Garage bay.
    #[arg(long)]
    pub bay: Option<String>,
}

impl PlacementArgs {
    pub fn context(&self) -> Result<NavigationContext> {
        Ok(match self.view {
            ViewArg::Inventory => NavigationContext::Inventory {
                location: self.location.clone(),
            },
            ViewArg::Showroom => match &self.floor {
                Some(floor) => NavigationContext::Showroom {
                    floor: floor.clone(),
                },
                None => bail!("--floor is required for the showroom view"),
            },
            ViewArg::Garage => NavigationContext::Garage {
                bay: self.bay.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manual_showroom_placement() {
        let cli = Cli::try_parse_from([
            "vinscan",
            "--data-dir",
            "/tmp/vinscan",
            "manual",
            "5YJ3E1EA7KF317000",
            "--view",
            "showroom",
            "--floor",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, PathBuf::from("/tmp/vinscan"));
        let Command::Manual { code, placement } = cli.command else {
            panic!("expected manual command");
        };
        assert_eq!(code, "5YJ3E1EA7KF317000");
        assert_eq!(
            placement.context().unwrap(),
            NavigationContext::Showroom { floor: "2".into() }
        );
    }

    #[test]
    fn showroom_without_floor_is_rejected() {
        let parsed = Cli::try_parse_from(["vinscan", "scan", "--view", "showroom"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn placement_defaults_to_inventory() {
        let cli = Cli::try_parse_from(["vinscan", "scan", "--location", "North Lot"]).unwrap();
        let Command::Scan { image, placement } = cli.command else {
            panic!("expected scan command");
        };
        assert_eq!(image, None);
        assert_eq!(
            placement.context().unwrap(),
            NavigationContext::Inventory {
                location: Some("North Lot".into())
            }
        );
    }
}
