//! CLI definition using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use emisi_domain::service::TestedFilter;
use emisi_types::{FuelType, Jenis, LoadCategory, OutputFormat};

#[derive(Parser)]
#[command(name = "uji-emisi")]
#[command(version)]
#[command(about = "Admin client for vehicle registration and emissions test results")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL. Uses config value if not specified.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Operator id sent with test results. Uses config value if not specified.
    #[arg(long, global = true)]
    pub user_id: Option<i64>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered vehicles with their test status
    List {
        /// Plate substring (case-insensitive)
        #[arg(long, short = 'p')]
        plat: Option<String>,

        /// Exact brand
        #[arg(long)]
        merek: Option<String>,

        /// Exact type
        #[arg(long)]
        tipe: Option<String>,

        /// Vehicle category
        #[arg(long, value_enum)]
        jenis: Option<Jenis>,

        /// Test status: all, tested, untested
        #[arg(long, short = 's', default_value = "all")]
        status: TestedFilter,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Load every page
        #[arg(long)]
        all: bool,
    },

    /// Show a vehicle and its test result
    Show {
        /// License plate
        plat: String,
    },

    /// Register a vehicle
    Register {
        #[arg(long, value_enum)]
        jenis: Jenis,

        /// License plate
        #[arg(long)]
        plat: String,

        #[arg(long)]
        merek: String,

        #[arg(long)]
        tipe: String,

        /// Year of manufacture
        #[arg(long)]
        tahun: String,

        /// Fuel type (bensin, solar)
        #[arg(long, value_enum, default_value_t = FuelType::Bensin)]
        fuel: FuelType,

        /// kendaraan_muatan, kendaraan_penumpang, <3.5ton, >=3.5ton
        #[arg(long)]
        load_category: LoadCategory,

        /// Institution name (dinas only)
        #[arg(long)]
        instansi: Option<String>,
    },

    /// Change fields of a registered vehicle
    Edit {
        /// License plate
        plat: String,

        #[arg(long)]
        merek: Option<String>,

        #[arg(long)]
        tipe: Option<String>,

        /// Year of manufacture
        #[arg(long)]
        tahun: Option<i32>,

        #[arg(long, value_enum)]
        jenis: Option<Jenis>,

        /// Fuel type (bensin, solar)
        #[arg(long, value_enum)]
        fuel: Option<FuelType>,

        /// kendaraan_muatan, kendaraan_penumpang, <3.5ton, >=3.5ton
        #[arg(long)]
        load_category: Option<LoadCategory>,

        /// Institution name (dinas only)
        #[arg(long)]
        instansi: Option<String>,
    },

    /// Delete a vehicle
    Delete {
        /// License plate
        plat: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Record (or replace) a test result
    Test {
        /// License plate
        plat: String,

        #[arg(long)]
        co: Option<String>,

        #[arg(long)]
        co2: Option<String>,

        #[arg(long)]
        hc: Option<String>,

        #[arg(long)]
        o2: Option<String>,

        #[arg(long)]
        lambda: Option<String>,

        #[arg(long)]
        opacity: Option<String>,
    },

    /// Remove a vehicle's test result
    ClearTest {
        /// License plate
        plat: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Import vehicles from a CSV file
    BatchUpload {
        /// Path to CSV file
        file: PathBuf,

        /// Only validate the rows locally
        #[arg(long)]
        check_only: bool,
    },

    /// Write the blank CSV import template
    Template {
        /// Output file path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Export loaded vehicles to CSV
    Export {
        /// Output file path
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// List brands and types known to the backend
    Options,

    /// Show fleet and test statistics
    Stats,

    /// Look up a user account
    User {
        /// User id
        id: i64,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set backend URL
        #[arg(long)]
        set_base_url: Option<String>,

        /// Set page size
        #[arg(long)]
        set_page_size: Option<usize>,

        /// Set operator id
        #[arg(long)]
        set_user_id: Option<i64>,

        /// Set session cookie (empty string clears it)
        #[arg(long)]
        set_cookie: Option<String>,

        /// Set request timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set notification duration in seconds
        #[arg(long)]
        set_toast_seconds: Option<u64>,
    },
}
