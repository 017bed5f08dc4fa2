use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings, Arg,
    ArgMatches, SubCommand,
};
use kagen::{
    comm::{launch, Communicator, SingleComm},
    error::Error as KaGenError,
    graph::GraphRepresentation,
    io::{
        find_by_extension, read_graph, write_graph, GraphDistribution, InputGraphConfig,
        OutputGraphConfig, FORMATS,
    },
    types::PEID,
};
use log::info;
use std::{
    error::Error,
    path::{Path, PathBuf},
};

fn format_of(matches: &ArgMatches, arg: &str, path: &Path) -> String {
    match matches.value_of(arg) {
        Some(format) => format.to_string(),
        None => find_by_extension(path).map_or("edgelist", |f| f.name).to_string(),
    }
}

fn parse_distribution(distribution: &str) -> GraphDistribution {
    match distribution {
        "edges" => GraphDistribution::BalanceEdges,
        _ => GraphDistribution::BalanceVertices,
    }
}

fn input_config(matches: &ArgMatches) -> Result<InputGraphConfig, Box<dyn Error>> {
    let path = value_t!(matches, "INPUT", PathBuf)?;
    Ok(InputGraphConfig::new(&path)
        .format(format_of(matches, "from", &path))
        .width(value_t!(matches, "input-width", usize)?)
        .directed(!matches.is_present("undirected"))
        .with_header(!matches.is_present("no-input-header"))
        .distribution(parse_distribution(
            matches.value_of("distribution").unwrap_or("vertices"),
        )))
}

/// Runs `f` on `ranks` ranks and reports the first failure.
fn run_ranks<F>(ranks: PEID, f: F) -> Result<(), Box<dyn Error>>
where
    F: Fn(&dyn Communicator) -> Result<(), KaGenError> + Sync,
{
    let results = launch(ranks, |comm| f(comm))?;
    for result in results {
        result?;
    }
    Ok(())
}

fn handle_convert(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let input = input_config(matches)?;
    let path = value_t!(matches, "OUTPUT", PathBuf)?;
    let output = OutputGraphConfig::new(&path)
        .format(format_of(matches, "to", &path))
        .width(value_t!(matches, "width", usize)?)
        .directed(!matches.is_present("undirected"))
        .with_header(!matches.is_present("no-output-header"))
        .distributed(matches.is_present("distributed"))
        .extension(matches.is_present("extension"));
    let ranks = value_t!(matches, "ranks", PEID)?;
    info!(
        "converting {} ({}) to {} ({}) on {} ranks",
        input.filename.display(),
        input.format,
        output.filename.display(),
        output.format,
        ranks
    );
    run_ranks(ranks, |comm| {
        let (graph, info) = read_graph(&input, GraphRepresentation::EdgeList, comm)?;
        write_graph(&output, &graph, info, comm)
    })
}

fn handle_size(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let input = input_config(matches)?;
    let (_, info) = read_graph(&input, GraphRepresentation::EdgeList, &SingleComm)?;
    println!("{}", info);
    Ok(())
}

fn handle_formats() {
    for factory in FORMATS.iter() {
        println!(
            "{:<28} .{:<28} {}",
            factory.name,
            factory.default_extension,
            if factory.reader.is_some() {
                "read/write"
            } else {
                "write"
            }
        );
    }
}

fn input_args<'a, 'b>(command: App<'a, 'b>) -> App<'a, 'b> {
    command
        .arg(Arg::with_name("INPUT").required(true))
        .arg(
            Arg::with_name("from")
                .help("Format of the input, guessed from the extension by default")
                .long("from")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input-width")
                .help("Integer width of binary input")
                .long("input-width")
                .takes_value(true)
                .default_value("8")
                .possible_values(&["4", "8"]),
        )
        .arg(
            Arg::with_name("no-input-header")
                .help("The input has no size header")
                .long("no-input-header")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("undirected")
                .help("Edges are stored once per undirected edge")
                .long("undirected")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("distribution")
                .help("How the input is split among the ranks")
                .long("distribution")
                .takes_value(true)
                .default_value("vertices")
                .possible_values(&["vertices", "edges"]),
        )
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let matches = App::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            input_args(SubCommand::with_name("convert"))
                .about("Converts a graph file into another format")
                .arg(Arg::with_name("OUTPUT").required(true))
                .arg(
                    Arg::with_name("to")
                        .help("Format of the output, guessed from the extension by default")
                        .long("to")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("ranks")
                        .help("Number of ranks reading and writing in parallel")
                        .long("ranks")
                        .short("n")
                        .takes_value(true)
                        .default_value("1"),
                )
                .arg(
                    Arg::with_name("width")
                        .help("Integer width of binary output")
                        .long("width")
                        .takes_value(true)
                        .default_value("8")
                        .possible_values(&["4", "8"]),
                )
                .arg(
                    Arg::with_name("no-output-header")
                        .help("Omits the size header")
                        .long("no-output-header")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("distributed")
                        .help("Writes one file per rank")
                        .long("distributed")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("extension")
                        .help("Appends the default extension of the output format")
                        .long("extension")
                        .takes_value(false),
                ),
        )
        .subcommand(
            input_args(SubCommand::with_name("size")).about("Displays n and m of a graph file"),
        )
        .subcommand(SubCommand::with_name("formats").about("Lists the supported formats"))
        .get_matches();
    if let Some(matches) = matches.subcommand_matches("convert") {
        handle_convert(matches)?;
    } else if let Some(matches) = matches.subcommand_matches("size") {
        handle_size(matches)?;
    } else if matches.subcommand_matches("formats").is_some() {
        handle_formats();
    }
    Ok(())
}
