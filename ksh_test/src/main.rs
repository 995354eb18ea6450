use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use ksh_lib::{KshDocument, KshFormat, Preserved, interface::AnalyzeOutput};
use log::{debug, info};
use rayon::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print debug messages while analyzing and building.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the vertex and pixel shader from a .ksh file.
    /// Each shader is saved using its stored name like "anim.vs".
    Analyze {
        /// The input .ksh file.
        input: String,
        /// The output folder. Defaults to the input's folder.
        output_folder: Option<String>,
        /// Overwrite existing shader files.
        #[arg(long)]
        force: bool,
        /// Print the shaders as JSON instead of saving files.
        #[arg(long)]
        json: bool,
    },
    /// Create a .ksh file from a vertex and pixel shader.
    Build {
        /// The vertex shader file or a folder containing a .vs and .ps file.
        input: String,
        /// The pixel shader file if the input is not a folder.
        ps: Option<String>,
        /// The output .ksh file.
        #[arg(short, long)]
        output: String,
        /// An existing .ksh file whose non shader data should be kept.
        #[arg(long)]
        original: Option<String>,
        /// Create a Don't Starve Together file instead of a container.
        /// Ignored if an original file is specified.
        #[arg(long)]
        legacy: bool,
        /// Overwrite an existing output file.
        #[arg(long)]
        force: bool,
    },
    /// Check that every .ksh file in a folder rebuilds to identical bytes.
    Check {
        /// The folder to search recursively.
        root_folder: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    let format = KshFormat::default();

    let start = std::time::Instant::now();
    match cli.command {
        Commands::Analyze {
            input,
            output_folder,
            force,
            json,
        } => analyze_file(&format, &input, output_folder.as_deref(), force, json)?,
        Commands::Build {
            input,
            ps,
            output,
            original,
            legacy,
            force,
        } => {
            let (vs, ps) = shader_paths(&input, ps.as_deref())?;
            build_file(
                &format,
                &vs,
                &ps,
                Path::new(&output),
                original.as_deref(),
                legacy,
                force,
            )?
        }
        Commands::Check { root_folder } => check_folder(&format, &root_folder)?,
    }

    info!("Finished in {:?}", start.elapsed());
    Ok(())
}

fn analyze_file(
    format: &KshFormat,
    input: &str,
    output_folder: Option<&str>,
    force: bool,
    json: bool,
) -> Result<()> {
    info!("Analyzing {input:?}");
    let bytes = std::fs::read(input).with_context(|| format!("failed to read {input:?}"))?;
    let document = KshDocument::from_bytes(format, &bytes)
        .with_context(|| format!("failed to analyze {input:?}"))?;

    if json {
        let output = AnalyzeOutput::from(&document);
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let output_folder = match output_folder {
        Some(folder) => PathBuf::from(folder),
        None => Path::new(input)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    std::fs::create_dir_all(&output_folder)?;

    // Check both paths before writing anything.
    let vs_path = shader_output_path(&output_folder, &document.vs.name)?;
    let ps_path = shader_output_path(&output_folder, &document.ps.name)?;
    for path in [&vs_path, &ps_path] {
        if !force && path.exists() {
            bail!("output file {path:?} already exists, use --force to overwrite");
        }
    }

    std::fs::write(&vs_path, &document.vs.content)?;
    std::fs::write(&ps_path, &document.ps.content)?;
    info!("Saved {vs_path:?} and {ps_path:?}");
    Ok(())
}

fn shader_output_path(output_folder: &Path, name: &str) -> Result<PathBuf> {
    // Names are stored in the file, so ignore any folders they contain.
    let file_name = Path::new(name)
        .file_name()
        .ok_or_else(|| anyhow!("shader name {name:?} is not a valid file name"))?;
    Ok(output_folder.join(file_name))
}

fn shader_paths(input: &str, ps: Option<&str>) -> Result<(PathBuf, PathBuf)> {
    match ps {
        Some(ps) => Ok((PathBuf::from(input), PathBuf::from(ps))),
        None => {
            let mut vs_path = None;
            let mut ps_path = None;
            for entry in std::fs::read_dir(input)? {
                let path = entry?.path();
                match path.extension().and_then(|e| e.to_str()) {
                    Some("vs") => vs_path = Some(path),
                    Some("ps") => ps_path = Some(path),
                    _ => (),
                }
            }
            match (vs_path, ps_path) {
                (Some(vs), Some(ps)) => Ok((vs, ps)),
                _ => bail!("{input:?} must contain a .vs and a .ps file"),
            }
        }
    }
}

fn build_file(
    format: &KshFormat,
    vs_path: &Path,
    ps_path: &Path,
    output: &Path,
    original: Option<&str>,
    legacy: bool,
    force: bool,
) -> Result<()> {
    if !force && output.exists() {
        bail!("output file {output:?} already exists, use --force to overwrite");
    }

    let preserved = match original {
        Some(original) => {
            let bytes = std::fs::read(original)?;
            KshDocument::from_bytes(format, &bytes)
                .with_context(|| format!("failed to analyze {original:?}"))?
                .preserved
        }
        None if legacy => {
            let file_name = output
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| anyhow!("output {output:?} has no file name"))?;
            Preserved::legacy(file_name)
        }
        None => Preserved::container(format),
    };

    let vs = ksh_lib::ShaderSection::vertex(file_name(vs_path)?, std::fs::read_to_string(vs_path)?);
    let ps = ksh_lib::ShaderSection::pixel(file_name(ps_path)?, std::fs::read_to_string(ps_path)?);

    let bytes = ksh_lib::build(format, &preserved, &vs, &ps)
        .with_context(|| format!("failed to build {output:?}"))?;
    std::fs::write(output, bytes)?;
    info!("Saved {output:?}");
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| anyhow!("{path:?} has no file name"))
}

fn check_folder(format: &KshFormat, root_folder: &str) -> Result<()> {
    let failures: usize = globwalk::GlobWalkerBuilder::from_patterns(root_folder, &["*.ksh"])
        .build()?
        .par_bridge()
        .map(|entry| match entry {
            Ok(entry) => match check_file(format, entry.path()) {
                Ok(()) => 0,
                Err(e) => {
                    println!("Error checking {:?}: {e:#}", entry.path());
                    1
                }
            },
            Err(e) => {
                println!("Error walking {root_folder:?}: {e}");
                1
            }
        })
        .sum();

    if failures > 0 {
        bail!("{failures} files did not rebuild identically");
    }
    Ok(())
}

fn check_file(format: &KshFormat, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let document = KshDocument::from_bytes(format, &bytes)?;
    let new_bytes = document.to_bytes(format)?;
    if new_bytes != bytes {
        let position = bytes
            .iter()
            .zip(&new_bytes)
            .position(|(a, b)| a != b)
            .unwrap_or(bytes.len().min(new_bytes.len()));
        bail!(
            "rebuilt {} bytes differs from original {} bytes at byte {position}",
            new_bytes.len(),
            bytes.len()
        );
    }
    debug!("{path:?} rebuilds identically");
    Ok(())
}
