use clap::Parser;
use std::path::PathBuf;

use nutrilabel::{create_nutrition_facts, LabelConfiguration, LabelError, NutrientInput};

/// Renders a nutrition-facts label from a JSON file of nutrient values.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct CliArguments {
    /// The JSON file with the serving size, the calories and the nutrient amounts.
    #[arg(short = 'i', long = "input", value_name = "json_file")]
    input_path: PathBuf,
    /// The JSON file naming the fonts and the other settings of the label.
    #[arg(short = 'c', long = "configuration", value_name = "json_file")]
    configuration_path: PathBuf,
    /// Where to write the label, overriding the output path of the configuration.
    #[arg(short = 'o', long = "output", value_name = "file_path")]
    output_path: Option<PathBuf>,
    /// Log everything the renderer does.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let arguments = CliArguments::parse();
    env_logger::builder()
        .filter_level(if arguments.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        })
        .init();

    if let Err(error) = fallible_main(arguments) {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main(arguments: CliArguments) -> Result<(), LabelError> {
    log::debug!("{:?}", arguments);

    let mut configuration = LabelConfiguration::from_path(&arguments.configuration_path)?;
    if let Some(output_path) = arguments.output_path {
        configuration.output_path = output_path;
    }
    let input = NutrientInput::from_path(&arguments.input_path)?;
    log::debug!("{:?}", input);

    let output_path = create_nutrition_facts(&input, &configuration)?;
    println!("{}", output_path.display());

    Ok(())
}
