// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    clap::{Args, Parser, Subcommand},
    faptly::{config::Config, error::Result, manager::Manager},
    std::path::PathBuf,
};

#[derive(Parser)]
#[command(
    name = "faptly",
    about = "Fast APT repository management tool",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings, resolved flag > environment > YAML file.
#[derive(Args)]
pub struct ConfigArgs {
    /// Load config from FILE
    #[arg(long, global = true, env = "FAPTLY_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// S3 endpoint URL
    #[arg(long, global = true, env = "FAPTLY_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// S3 bucket name
    #[arg(long, global = true, env = "FAPTLY_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// S3 access key
    #[arg(long, global = true, env = "FAPTLY_S3_ACCESS_KEY")]
    pub s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, global = true, env = "FAPTLY_S3_SECRET_KEY")]
    pub s3_secret_key: Option<String>,

    /// Load the private GPG key from FILE
    #[arg(long, global = true, env = "FAPTLY_PRIVATE_GPG_KEY", value_name = "FILE")]
    pub private_gpg_key: Option<PathBuf>,

    /// Private GPG key passphrase
    #[arg(long, global = true, env = "FAPTLY_PRIVATE_GPG_PASSKEY")]
    pub private_gpg_passkey: Option<String>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };

        if let Some(v) = &self.s3_endpoint {
            config.s3_endpoint = v.clone();
        }
        if let Some(v) = &self.s3_bucket {
            config.s3_bucket = v.clone();
        }
        if let Some(v) = &self.s3_access_key {
            config.s3_access_key = v.clone();
        }
        if let Some(v) = &self.s3_secret_key {
            config.s3_secret_key = v.clone();
        }
        if let Some(path) = &self.private_gpg_key {
            config.private_gpg_key = std::fs::read_to_string(path)?;
        }
        if let Some(v) = &self.private_gpg_passkey {
            config.private_gpg_passkey = v.clone();
        }

        config.validate()?;

        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage repositories
    #[command(subcommand)]
    Repo(RepoCommand),

    /// Manage packages
    #[command(subcommand)]
    Pkg(PkgCommand),
}

#[derive(Subcommand)]
pub enum RepoCommand {
    /// List all available repositories
    List,

    /// Show repository configuration
    Show {
        /// Repository suite
        suite: String,
    },

    /// Create a repository
    Create {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        suite: String,
        #[arg(long)]
        label: String,
        #[arg(long)]
        codename: String,
        #[arg(long)]
        description: String,
        /// Component to declare (repeatable)
        #[arg(long = "component", required = true)]
        components: Vec<String>,
        /// Architecture to declare (repeatable)
        #[arg(long = "architecture", required = true)]
        architectures: Vec<String>,
    },

    /// Delete repository
    Delete {
        /// Repository suite
        suite: String,
    },
}

#[derive(Subcommand)]
pub enum PkgCommand {
    /// List all available packages
    List {
        #[arg(long)]
        suite: String,
        #[arg(long)]
        component: String,
        #[arg(long)]
        architecture: String,
    },

    /// Show package configuration
    Show {
        #[arg(long)]
        suite: String,
        #[arg(long)]
        component: String,
        #[arg(long)]
        architecture: String,
        /// Package basename, e.g. hello_1.0_amd64.deb
        package: String,
    },

    /// Upload packages to repository
    Upload {
        #[arg(long)]
        suite: String,
        #[arg(long)]
        component: String,
        /// .deb files to upload
        #[arg(required = true)]
        packages: Vec<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.resolve()?;
    let manager = Manager::new(&config)?;

    match cli.command {
        Commands::Repo(command) => run_repo(&manager, command).await,
        Commands::Pkg(command) => run_pkg(&manager, command).await,
    }
}

async fn run_repo(manager: &Manager, command: RepoCommand) -> Result<()> {
    match command {
        RepoCommand::List => {
            let releases = manager.list_repos().await?;

            if releases.is_empty() {
                println!("No repositories found, create one with `faptly repo create ...`.");
            } else {
                println!("List of repositories:");
                for release in &releases {
                    let architectures = release
                        .architectures
                        .iter()
                        .map(|a| a.cpu.as_str())
                        .collect::<Vec<_>>()
                        .join("|");

                    println!(
                        " * {} [{}] ({}): {}",
                        release.suite,
                        release.components.join(", "),
                        architectures,
                        release.description
                    );
                }
                println!();
                println!("To get more information about a repository, run `faptly repo show <suite>`.");
            }

            Ok(())
        }
        RepoCommand::Show { suite } => {
            let release = manager.show_repo(&suite).await?;
            print!("{}", release.to_paragraph());

            Ok(())
        }
        RepoCommand::Create {
            origin,
            suite,
            label,
            codename,
            description,
            components,
            architectures,
        } => {
            manager
                .create_repo(
                    &origin,
                    &suite,
                    &label,
                    &codename,
                    &description,
                    &components,
                    &architectures,
                )
                .await
        }
        RepoCommand::Delete { suite } => manager.delete_repo(&suite).await,
    }
}

async fn run_pkg(manager: &Manager, command: PkgCommand) -> Result<()> {
    match command {
        PkgCommand::List {
            suite,
            component,
            architecture,
        } => {
            let packages = manager.list_pkgs(&suite, &component, &architecture).await?;

            if packages.is_empty() {
                println!("No packages found, upload one with `faptly pkg upload ...`.");
            } else {
                println!("List of packages:");
                for package in &packages {
                    if let Some(basename) = package.basename() {
                        println!(" - {}", basename);
                    }
                }
                println!();
                println!("To get more information about a package, run `faptly pkg show <package>`.");
            }

            Ok(())
        }
        PkgCommand::Show {
            suite,
            component,
            architecture,
            package,
        } => {
            if let Some(entry) = manager
                .show_pkg(&suite, &component, &architecture, &package)
                .await?
            {
                print!("{}", entry);
            }

            Ok(())
        }
        PkgCommand::Upload {
            suite,
            component,
            packages,
        } => manager.upload_pkgs(&suite, &component, &packages).await,
    }
}
