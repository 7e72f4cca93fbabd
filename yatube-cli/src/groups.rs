use clap::{App, Arg, ArgMatches, SubCommand};

use yatube_models::{
    groups::{Group, NewGroup},
    Connection,
};

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("groups")
        .about("Manage groups")
        .subcommand(
            SubCommand::with_name("new")
                .arg(
                    Arg::with_name("title")
                        .short("t")
                        .long("title")
                        .takes_value(true)
                        .help("The title of the group"),
                )
                .arg(
                    Arg::with_name("slug")
                        .short("s")
                        .long("slug")
                        .takes_value(true)
                        .help("The address of the group, derived from the title by default"),
                )
                .arg(
                    Arg::with_name("description")
                        .short("d")
                        .long("description")
                        .takes_value(true)
                        .help("What the group is about"),
                )
                .about("Create a new group"),
        )
        .subcommand(SubCommand::with_name("list").about("List every group"))
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("new", Some(x)) => new(x, conn),
        ("list", Some(_)) => list(conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn new<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let title = args
        .value_of("title")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Title"));
    let slug = args
        .value_of("slug")
        .map(String::from)
        .or_else(|| Group::slug_for(&title))
        .unwrap_or_else(|| super::ask_for("Slug (latin letters, digits, - and _)"));
    let description = args.value_of("description").unwrap_or("").to_owned();

    let group = NewGroup::create(conn, title, Some(slug), description)
        .expect("Couldn't create the group");
    println!("Group created at /group/{}/", group.slug);
}

fn list(conn: &Connection) {
    for group in Group::list(conn).expect("Couldn't list groups") {
        let posts = group.count_posts(conn).expect("Couldn't count posts");
        println!("{}\t{}\t{} posts", group.slug, group.title, posts);
    }
}
