use clap::{App, Arg, ArgMatches, SubCommand};

use std::io::{self, Write};
use yatube_models::{
    users::{NewUser, User},
    Connection,
};

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("users")
        .about("Manage users")
        .subcommand(
            SubCommand::with_name("new")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .alias("username")
                        .takes_value(true)
                        .help("The username of the new user"),
                )
                .arg(
                    Arg::with_name("display-name")
                        .short("N")
                        .long("display-name")
                        .takes_value(true)
                        .help("The display name of the new user"),
                )
                .arg(
                    Arg::with_name("email")
                        .short("e")
                        .long("email")
                        .takes_value(true)
                        .help("Email address of the new user"),
                )
                .arg(
                    Arg::with_name("password")
                        .short("p")
                        .long("password")
                        .takes_value(true)
                        .help("The password of the new user"),
                )
                .arg(
                    Arg::with_name("admin")
                        .short("a")
                        .long("admin")
                        .help("Makes the user an administrator of the site"),
                )
                .about("Create a new user"),
        )
        .subcommand(
            SubCommand::with_name("admin")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .alias("username")
                        .takes_value(true)
                        .required(true)
                        .help("The username of the user"),
                )
                .arg(
                    Arg::with_name("revoke")
                        .short("r")
                        .long("revoke")
                        .help("Takes the administrator rights away instead"),
                )
                .about("Grant or revoke administrator rights"),
        )
        .subcommand(
            SubCommand::with_name("reset-password")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .alias("username")
                        .takes_value(true)
                        .required(true)
                        .help("The username of the user"),
                )
                .arg(
                    Arg::with_name("password")
                        .short("p")
                        .long("password")
                        .takes_value(true)
                        .help("The new password, asked for if missing"),
                )
                .about("Set a new password for a user"),
        )
        .subcommand(SubCommand::with_name("list").about("List every user"))
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("new", Some(x)) => new(x, conn),
        ("admin", Some(x)) => admin(x, conn),
        ("reset-password", Some(x)) => reset_password(x, conn),
        ("list", Some(_)) => list(conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn new<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let username = args
        .value_of("name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Username"));
    let display_name = args
        .value_of("display-name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Display name"));
    let admin = args.is_present("admin");
    let email = args
        .value_of("email")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Email address"));
    let password = args
        .value_of("password")
        .map(String::from)
        .unwrap_or_else(|| read_password("Password"));

    NewUser::new_local(
        conn,
        username,
        display_name,
        admin,
        Some(email).filter(|e| !e.is_empty()),
        Some(User::hash_pass(&password).expect("Couldn't hash password")),
    )
    .expect("Couldn't save new user");
}

fn admin<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let username = args.value_of("name").unwrap_or_default();
    let user = User::find_by_name(conn, username).expect("This user doesn't exist");
    user.set_admin(conn, !args.is_present("revoke"))
        .expect("Couldn't update the user");
}

fn reset_password<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let username = args.value_of("name").unwrap_or_default();
    let user = User::find_by_name(conn, username).expect("This user doesn't exist");
    let password = args
        .value_of("password")
        .map(String::from)
        .unwrap_or_else(|| read_password("New password"));
    user.reset_password(conn, &password)
        .expect("Couldn't reset the password");
    println!("Password of {} changed", user.username);
}

fn read_password(prompt: &str) -> String {
    print!("{}: ", prompt);
    io::stdout().flush().expect("Couldn't flush STDOUT");
    rpassword::read_password().expect("Couldn't read your password.")
}

fn list(conn: &Connection) {
    for user in User::list(conn).expect("Couldn't list users") {
        println!(
            "{}\t{}{}",
            user.username,
            user.name(),
            if user.is_admin { "\t(admin)" } else { "" }
        );
    }
}
