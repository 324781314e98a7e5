//! Bubbles CLI - Generate seed folders, evolve circle lists and render them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use bubbles::{
    Circle, EvolutionEngine, FitnessEvaluator, RunConfig, SourceImage,
    compute::{GradientField, seed_candidates},
    io::{self, SvgOptions},
};

const OUTPUT_IMAGE: &str = "output.png";
const OUTPUT_SVG: &str = "circles.svg";
const OUTPUT_ERROR: &str = "error.txt";
const OUTPUT_CIRCLES: &str = "best_circles.csv";
const OUTPUT_RESULT: &str = "result.json";

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 4 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let image_path = PathBuf::from(&args[2]);
    let target = PathBuf::from(&args[3]);
    let extra = args.get(4).map(PathBuf::from);

    match args[1].as_str() {
        "seed" => run_seed(&image_path, &target, extra.as_deref()),
        "evolve" => run_evolve(&image_path, &target, extra.as_deref()),
        "evaluate" => run_evaluate(&image_path, &target, extra.as_deref()),
        other => {
            eprintln!("Unknown mode: {}", other);
            print_usage(&args[0]);
            process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} seed <image> <seed_dir> [config.json]", program);
    eprintln!("  {} evolve <image> <seed_dir> [config.json]", program);
    eprintln!("  {} evaluate <image> <circles.csv> [out_dir]", program);
    eprintln!("  {} --example", program);
    eprintln!();
    eprintln!("Approximate a grayscale image with circle outlines.");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  seed      Write seed_XXX.csv candidates into seed_dir");
    eprintln!("  evolve    Evolve the seeds in seed_dir; results go to the working directory");
    eprintln!("  evaluate  Score one circle list and render it into out_dir (default: .)");
    eprintln!();
    eprintln!("Example configuration is printed with the --example flag.");
}

fn print_example_config() {
    let config = RunConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> RunConfig {
    let config = match path {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                process::exit(1);
            })
        }
        None => RunConfig::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        process::exit(1);
    }
    config
}

fn load_image(path: &Path) -> Arc<SourceImage> {
    let image = io::load_grayscale(path).unwrap_or_else(|e| {
        eprintln!("Error loading image {}: {}", path.display(), e);
        process::exit(1);
    });
    Arc::new(image)
}

fn run_seed(image_path: &Path, seed_dir: &Path, config_path: Option<&Path>) {
    let config = load_config(config_path);
    let image = load_image(image_path);

    println!("Bubbles Seeding");
    println!("===============");
    println!("Image: {}x{}", image.width, image.height);
    println!("Seeds: {}", config.seeding.num_seeds);
    println!("Circles per seed: {}", config.evolution.circles_per_candidate);
    println!("Method: {:?}", config.seeding.method);
    println!();

    let start = Instant::now();
    let field = GradientField::new(&image);
    let mut rng = match config.evolution.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let seeds = seed_candidates(
        &field,
        &mut rng,
        config.evolution.circles_per_candidate,
        config.evolution.radius_bounds,
        &config.seeding,
    );

    let written = io::write_seed_folder(seed_dir, &seeds).unwrap_or_else(|e| {
        eprintln!("Error writing seed folder: {}", e);
        process::exit(1);
    });
    println!(
        "Wrote {} seed files to {} in {:.2}s",
        written.len(),
        seed_dir.display(),
        start.elapsed().as_secs_f32()
    );
}

fn run_evolve(image_path: &Path, seed_dir: &Path, config_path: Option<&Path>) {
    let config = load_config(config_path);
    let image = load_image(image_path);

    println!("Bubbles Evolution");
    println!("=================");
    println!("Image: {}x{}", image.width, image.height);
    println!("Population: {}", config.evolution.population.size);
    println!("Circles per candidate: {}", config.evolution.circles_per_candidate);
    println!("Generation cap: {}", config.evolution.population.max_generations);
    println!();

    let mut engine = EvolutionEngine::new(config.evolution, image).unwrap_or_else(|e| {
        eprintln!("Error creating engine: {}", e);
        process::exit(1);
    });
    if let Err(e) = engine.load_seed_folder(seed_dir) {
        eprintln!("Error loading seeds from {}: {}", seed_dir.display(), e);
        process::exit(1);
    }

    let result = engine
        .run_with_callback(|progress| {
            let elites: Vec<String> = progress
                .elites
                .iter()
                .map(|e| format!("#{} {:.4}", e.id, e.fitness))
                .collect();
            println!(
                "  Generation {}/{}: best={:.4}, avg={:.4}, elites=[{}]",
                progress.generation,
                progress.total_generations,
                progress.best_fitness,
                progress.avg_fitness,
                elites.join(", ")
            );
        })
        .unwrap_or_else(|e| {
            eprintln!("Evolution failed: {}", e);
            process::exit(1);
        });

    println!();
    println!("Stopped: {:?}", result.stats.stop_reason);
    println!(
        "Best: fitness={:.4}, error={:.3}, segments={}",
        result.best.summary.fitness, result.best.summary.error, result.best.summary.num_segments
    );
    println!(
        "Time: {:.2}s ({} evaluations)",
        result.stats.elapsed_seconds, result.stats.total_evaluations
    );

    let out_dir = Path::new(".");
    write_outputs(out_dir, engine.evaluator(), &result.best.circles);

    let result_json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
        eprintln!("Error serializing result: {}", e);
        process::exit(1);
    });
    if let Err(e) = fs::write(out_dir.join(OUTPUT_RESULT), result_json) {
        eprintln!("Error writing {}: {}", OUTPUT_RESULT, e);
        process::exit(1);
    }
}

fn run_evaluate(image_path: &Path, circles_path: &Path, out_dir: Option<&Path>) {
    let image = load_image(image_path);
    let config = load_config(None);
    let evaluator = FitnessEvaluator::new(image, config.evolution.evaluation).unwrap_or_else(|e| {
        eprintln!("Error creating evaluator: {}", e);
        process::exit(1);
    });
    let circles = io::read_circles(circles_path).unwrap_or_else(|e| {
        eprintln!("Error reading circles: {}", e);
        process::exit(1);
    });

    let out_dir = out_dir.unwrap_or(Path::new("."));
    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Error creating {}: {}", out_dir.display(), e);
        process::exit(1);
    }
    write_outputs(out_dir, &evaluator, &circles);
}

/// Render a circle list and write image, SVG, error and circle files.
fn write_outputs(dir: &Path, evaluator: &FitnessEvaluator, circles: &[Circle]) {
    let start = Instant::now();
    let evaluation = evaluator.evaluate(circles);
    let image = evaluator.image();

    println!(
        "Circles: {}, segments: {}, error: {:.3}, fitness: {:.4} ({:.1} ms)",
        circles.len(),
        evaluation.num_segments,
        evaluation.error,
        evaluation.fitness,
        start.elapsed().as_secs_f32() * 1000.0
    );

    let labels = evaluation
        .segments
        .segment_labels(evaluator.config().grey_step());
    let options = SvgOptions {
        background: Some(PathBuf::from(OUTPUT_IMAGE)),
        ..Default::default()
    };

    let written = io::save_grayscale(
        &dir.join(OUTPUT_IMAGE),
        image.width,
        image.height,
        &evaluation.pixels,
    )
    .and_then(|_| io::write_svg(&dir.join(OUTPUT_SVG), circles, &labels, &options))
    .and_then(|_| io::write_circles(&dir.join(OUTPUT_CIRCLES), circles))
    .and_then(|_| {
        fs::write(dir.join(OUTPUT_ERROR), format!("{}\n", evaluation.error))
            .map_err(io::IoError::from)
    });

    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
    println!(
        "Wrote {}, {}, {} and {} to {}",
        OUTPUT_IMAGE,
        OUTPUT_SVG,
        OUTPUT_CIRCLES,
        OUTPUT_ERROR,
        dir.display()
    );
}
