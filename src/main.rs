use clap::Parser;
use form_builder::cli::commands::{
    cmd_fill, cmd_import, cmd_list, cmd_options, cmd_submissions, cmd_validate,
};
use form_builder::cli::config::{Cli, Commands, load_config, resolve_store_path};
use form_builder::cli::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let config = load_config(cli.config.as_deref());

    // Store path: CLI > config > default
    let store_path = resolve_store_path(&config, cli.store.as_deref());

    match &cli.command {
        Commands::Validate { schema } => cmd_validate(schema)?,
        Commands::Options {
            schema,
            field,
            parent,
        } => cmd_options(schema, field, parent, &config, cli.timeout)?,
        Commands::Fill {
            schema,
            set,
            submit,
        } => cmd_fill(schema, set, *submit, store_path, &config, cli.timeout)?,
        Commands::Import {
            schema,
            name,
            description,
        } => cmd_import(schema, name.as_deref(), description.as_deref(), store_path)?,
        Commands::List => cmd_list(store_path)?,
        Commands::Submissions { form } => cmd_submissions(form, store_path)?,
    }

    Ok(())
}
