//! Prints the iris dataset summary as JSON, or the full table as CSV.

use std::io;

use iris_classifier::loader;

fn main() {
	if let Err(err) = run(std::env::args().skip(1).collect()) {
		eprintln!("{}", err);
		std::process::exit(1);
	}
}

fn run(args: Vec<String>) -> Result<(), String> {
	match args.first().map(String::as_str) {
		None => {
			let info = serde_json::to_string_pretty(&loader::dataset_info()).map_err(|err| err.to_string())?;
			println!("{}", info);
			Ok(())
		}
		Some("--csv") => loader::as_table()
			.write_csv(io::stdout().lock())
			.map_err(|err| format!("Failed to write csv: {}", err)),
		Some("--help") | Some("-h") => {
			print_help();
			Ok(())
		}
		Some(arg) => Err(format!("Unknown argument: {}", arg)),
	}
}

fn print_help() {
	println!("Usage: info [--csv]");
	println!();
	println!("Options:");
	println!("  --csv  Print all 150 rows as CSV instead of the JSON summary");
}
