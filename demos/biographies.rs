//! Attaching parsed data to strings you do not own.
//!
//! This example demonstrates:
//! 1. Typed properties: each biography string carries the `Person` parsed
//!    from it
//! 2. Cached properties: the collection of biographies carries a `Records`
//!    value that is created on first use
//! 3. Identity: a copy of a biography is a different owner
//!
//! Raise the subscriber's max level to `TRACE` to see the table's own events.

use std::sync::{Arc, Mutex};

use fused::prelude::*;
use regex::Regex;
use rootcause::{option_ext::OptionExt, prelude::*};
use tracing::Level;

const BIOGRAPHIES: [&str; 4] = [
    "Alan Turing (mathematician; born June 23, 1912)",
    "Grace Hopper (computer scientist; born December 9, 1906)",
    "Edsger Dijkstra (computer scientist; born May 11, 1930)",
    "Barbara Liskov (computer scientist; born November 7, 1939)",
];

const PATTERN: &str =
    r"(?<first>\w+) (?<last>\w+) \(.*; born (?<month>\w+) (?<day>\d+), (?<year>\d+)\)";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug)]
struct Person {
    first_name: String,
    last_name: String,
    born: (u32, u32, u32),
}

/// The youngest and oldest person seen so far in one collection.
#[derive(Default)]
struct Records {
    youngest: Mutex<Option<Arc<Person>>>,
    oldest: Mutex<Option<Arc<Person>>>,
}

impl Records {
    fn observe(&self, person: &Arc<Person>) {
        let mut youngest = self.youngest.lock().unwrap_or_else(|e| e.into_inner());
        if youngest.as_ref().is_none_or(|y| person.born > y.born) {
            *youngest = Some(Arc::clone(person));
        }

        let mut oldest = self.oldest.lock().unwrap_or_else(|e| e.into_inner());
        if oldest.as_ref().is_none_or(|o| person.born < o.born) {
            *oldest = Some(Arc::clone(person));
        }
    }
}

fn month_number(month: &str) -> Result<u32, Report> {
    let index = MONTHS
        .iter()
        .position(|m| *m == month)
        .context("Unknown month")
        .attach(format!("Month: {month}"))?;
    Ok(index as u32 + 1)
}

/// Parses a biography and attaches the result to it.
fn parse_person(pattern: &Regex, bio: &Arc<str>) -> Result<Arc<Person>, Report> {
    if let Some(person) = bio.get_fused_typed::<Person>() {
        return Ok(person);
    }

    let captures = pattern
        .captures(bio)
        .context("Biography does not match the expected format")
        .attach(format!("Biography: {bio}"))?;

    let person = Person {
        first_name: captures["first"].to_owned(),
        last_name: captures["last"].to_owned(),
        born: (
            captures["year"].parse::<u32>().context("Invalid birth year")?,
            month_number(&captures["month"])?,
            captures["day"].parse::<u32>().context("Invalid birth day")?,
        ),
    };
    bio.set_fused_typed(person);

    let person = bio
        .get_fused_typed::<Person>()
        .context("Parsed person was not attached")?;
    Ok(person)
}

fn run() -> Result<(), Report> {
    let pattern = Regex::new(PATTERN).context("Failed to compile the biography pattern")?;

    let people: Arc<Vec<Arc<str>>> = Arc::new(BIOGRAPHIES.iter().map(|&b| Arc::from(b)).collect());

    for bio in people.iter() {
        let person = parse_person(&pattern, bio).context("Failed to read biography")?;
        people.fused::<Records>().observe(&person);
        tracing::info!(
            first = %person.first_name,
            last = %person.last_name,
            "parsed biography"
        );
    }

    // Parsing again finds the attached value instead of re-running the regex.
    let again = parse_person(&pattern, &people[0])?;
    println!("{} {} was born in {}", again.first_name, again.last_name, again.born.0);

    // A copy of the text is a different owner and has nothing attached.
    let copy: Arc<str> = Arc::from(&*people[0]);
    println!("Copy has a person attached: {}", copy.get_fused_typed::<Person>().is_some());

    let records = people.fused::<Records>();
    let youngest = records.youngest.lock().unwrap_or_else(|e| e.into_inner());
    let oldest = records.oldest.lock().unwrap_or_else(|e| e.into_inner());
    if let (Some(youngest), Some(oldest)) = (youngest.as_ref(), oldest.as_ref()) {
        println!("Youngest: {} {}", youngest.first_name, youngest.last_name);
        println!("Oldest: {} {}", oldest.first_name, oldest.last_name);
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    println!("=== Biographies ===\n");
    if let Err(report) = run() {
        eprintln!("{report}");
    }

    // A malformed biography produces a report instead of a property.
    let pattern = Regex::new(PATTERN).expect("pattern is valid");
    let broken: Arc<str> = Arc::from("Ada Lovelace (mathematician; born Decembre 10, 1815)");
    if let Err(report) = parse_person(&pattern, &broken) {
        println!("\n{report}");
    }
}
