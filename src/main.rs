use std::process::ExitCode;

use workflow_canvas::{all_templates, build_template, templates::template_by_key, TemplateKind};

fn main() -> ExitCode {
    // Set up logging for development
    env_logger::init();

    let key = std::env::args().nth(1);
    let kind = match key.as_deref() {
        None => TemplateKind::DecisionBranch,
        Some(key) => match template_by_key(key) {
            Some(kind) => kind,
            None => {
                eprintln!("Unknown template '{key}'. Available templates:");
                for info in all_templates() {
                    eprintln!("  {:<10} {}", info.key, info.name);
                }
                return ExitCode::FAILURE;
            }
        },
    };

    // Print the template document as JSON
    match build_template(kind).to_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Failed to serialize template: {err}");
            ExitCode::FAILURE
        }
    }
}
