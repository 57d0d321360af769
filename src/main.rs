use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use m31hst::ast::AstTable;
use m31hst::band::{Band, parse_band_list};
use m31hst::completeness::CompletenessKernel;
use m31hst::config::DataRoots;
use m31hst::draine::spire350_dust_mass_map;
use m31hst::paths::{
    BrownBand, BrownField, BrownProduct, DEFAULT_PHOT_KIND, brown_image_path, brown_phot_path,
    phat_brick_path, phat_field_path, phat_phot_path, phat_v2_ast_path,
};
use m31hst::phatast::{Axis, Hess, HessSpec, PhatAstFields};

#[derive(Parser)]
#[command(name = "m31hst", about = "PHAT and Brown HST data access for M31")]
struct Cli {
    /// PHAT data root (defaults to $PHATDATA).
    #[arg(long, global = true)]
    phat_root: Option<PathBuf>,

    /// Brown GO-10265 data root (defaults to $BROWNDATA).
    #[arg(long, global = true)]
    brown_root: Option<PathBuf>,

    /// Draine dust map root (defaults to $DRAINEDATA).
    #[arg(long, global = true)]
    draine_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the path of a data product.
    Locate {
        #[command(subcommand)]
        product: Product,
    },

    /// Write a StarFISH crowding file for one PHAT AST field.
    Crowdfile {
        /// Field index (0-5).
        #[arg(long)]
        field: usize,

        /// Comma-separated bands, in output column order (e.g. "f475w,f814w").
        #[arg(long)]
        bands: String,

        /// Output path.
        #[arg(short, long)]
        output: PathBuf,

        /// AST catalog (defaults to the PHAT v2 catalog under the PHAT root).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Print a completeness or error Hess diagram for one PHAT AST field.
    Hess {
        /// Field index (0-5).
        #[arg(long)]
        field: usize,

        #[arg(long, value_enum, default_value = "completeness")]
        kind: HessKind,

        /// Band whose recovery or error is measured.
        #[arg(long)]
        band: String,

        /// X axis: a band ("f814w") or a colour ("f475w-f814w").
        #[arg(long)]
        x: String,

        /// Y axis: a band or a colour.
        #[arg(long)]
        y: String,

        /// X range, inclusive (e.g. "-1,5").
        #[arg(long, allow_hyphen_values = true)]
        x_span: String,

        /// Y range, inclusive (e.g. "20,28").
        #[arg(long, allow_hyphen_values = true)]
        y_span: String,

        #[arg(long, default_value = "0.1")]
        dx: f64,

        #[arg(long, default_value = "0.1")]
        dy: f64,

        /// AST catalog (defaults to the PHAT v2 catalog under the PHAT root).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Completeness of a star in a Brown field.
    Completeness {
        /// Brown field name (halo11, stream, disk, halo21, halo35a, halo35b).
        #[arg(long)]
        field: String,

        #[arg(long)]
        m606w: f64,

        #[arg(long)]
        m814w: f64,
    },
}

#[derive(Subcommand)]
enum Product {
    /// PHAT field photometry catalog.
    PhatPhot {
        brick: u32,
        field: u32,
        /// Filter set, e.g. "f275w-f336w".
        filterset: String,
        #[arg(long, default_value = DEFAULT_PHOT_KIND)]
        kind: String,
    },
    /// PHAT brick drizzled image.
    PhatBrick { brick: u32, band: String },
    /// PHAT field drizzled image.
    PhatField { brick: u32, field: u32, band: String },
    /// PHAT v2 artificial star catalog.
    Ast,
    /// Brown photometry product (cat, art, msk).
    BrownPhot {
        field: String,
        #[arg(default_value = "cat")]
        kind: String,
    },
    /// Brown drizzled image (f606w, f814w).
    BrownImage { field: String, band: String },
    /// Draine SPIRE 350 dust mass map.
    Dust,
}

#[derive(Clone, Copy, ValueEnum)]
enum HessKind {
    Completeness,
    Error,
}

fn parse_span(s: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        bail!("range must be two comma-separated values (e.g. \"20,28\"), got '{s}'");
    }
    let lo: f64 = parts[0]
        .trim()
        .parse()
        .with_context(|| format!("invalid lower bound '{}'", parts[0]))?;
    let hi: f64 = parts[1]
        .trim()
        .parse()
        .with_context(|| format!("invalid upper bound '{}'", parts[1]))?;
    Ok((lo, hi))
}

fn load_fields(roots: &DataRoots, catalog: Option<&Path>) -> Result<PhatAstFields> {
    let path = match catalog {
        Some(p) => p.to_path_buf(),
        None => phat_v2_ast_path(roots)?,
    };
    let table = AstTable::read(&path)
        .with_context(|| format!("failed to load AST catalog {}", path.display()))?;
    Ok(PhatAstFields::new(table)?)
}

fn cmd_locate(roots: &DataRoots, product: &Product) -> Result<()> {
    let path = match product {
        Product::PhatPhot {
            brick,
            field,
            filterset,
            kind,
        } => phat_phot_path(roots, *brick, *field, filterset, kind)?,
        Product::PhatBrick { brick, band } => phat_brick_path(roots, *brick, band.parse()?)?,
        Product::PhatField { brick, field, band } => {
            phat_field_path(roots, *brick, *field, band.parse()?)?
        }
        Product::Ast => phat_v2_ast_path(roots)?,
        Product::BrownPhot { field, kind } => brown_phot_path(
            roots,
            field.parse::<BrownField>()?,
            kind.parse::<BrownProduct>()?,
        )?,
        Product::BrownImage { field, band } => brown_image_path(
            roots,
            field.parse::<BrownField>()?,
            band.parse::<BrownBand>()?,
        )?,
        Product::Dust => spire350_dust_mass_map(roots)?,
    };
    println!("{}", path.display());
    Ok(())
}

fn cmd_crowdfile(
    roots: &DataRoots,
    field: usize,
    bands: &str,
    output: &Path,
    catalog: Option<&Path>,
) -> Result<()> {
    let bands = parse_band_list(bands)?;
    let fields = load_fields(roots, catalog)?;
    let n = fields.write_crowdfile(field, &bands, output)?;
    info!("Field {field}: {n} stars written to {}", output.display());
    Ok(())
}

fn print_hess(hess: &Hess) {
    println!(
        "# x_edges: {}",
        hess.x_edges
            .iter()
            .map(|v| format!("{v:.3}"))
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!(
        "# y_edges: {}",
        hess.y_edges
            .iter()
            .map(|v| format!("{v:.3}"))
            .collect::<Vec<_>>()
            .join(" ")
    );
    for row in hess.values.rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
        println!("{}", line.join(" "));
    }
}

fn cmd_completeness(roots: &DataRoots, field: &str, m606w: f64, m814w: f64) -> Result<()> {
    let field: BrownField = field.parse()?;
    let path = brown_phot_path(roots, field, BrownProduct::Art)?;
    let kernel = CompletenessKernel::load(&path)?;
    println!("{:.4}", kernel.lookup(m606w, m814w));
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut roots = DataRoots::from_env();
    if let Some(p) = cli.phat_root {
        roots = roots.with_phat(p);
    }
    if let Some(p) = cli.brown_root {
        roots = roots.with_brown(p);
    }
    if let Some(p) = cli.draine_root {
        roots = roots.with_draine(p);
    }

    match &cli.command {
        Commands::Locate { product } => cmd_locate(&roots, product),
        Commands::Crowdfile {
            field,
            bands,
            output,
            catalog,
        } => cmd_crowdfile(&roots, *field, bands, output, catalog.as_deref()),
        Commands::Hess {
            field,
            kind,
            band,
            x,
            y,
            x_span,
            y_span,
            dx,
            dy,
            catalog,
        } => {
            let band: Band = band.parse()?;
            let spec = HessSpec {
                x: x.parse::<Axis>()?,
                y: y.parse::<Axis>()?,
                x_span: parse_span(x_span)?,
                y_span: parse_span(y_span)?,
                dx: *dx,
                dy: *dy,
            };
            let fields = load_fields(&roots, catalog.as_deref())?;
            let hess = match kind {
                HessKind::Completeness => fields.completeness_hess(*field, band, &spec)?,
                HessKind::Error => fields.error_hess(*field, band, &spec)?,
            };
            print_hess(&hess);
            Ok(())
        }
        Commands::Completeness {
            field,
            m606w,
            m814w,
        } => cmd_completeness(&roots, field, *m606w, *m814w),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
