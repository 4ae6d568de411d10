//! Specialist directory commands.

use chrono::Local;
use clap::Subcommand;
use console::style;

use sh_core::error::ShResult;
use sh_models::{Doctor, Role};
use sh_services::{DoctorFilter, DoctorSort, ServiceRegistry};

use crate::OutputFormat;

/// Sort options for doctor listing.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SortArg {
    /// Highest rated first.
    Rating,
    /// Most experienced first.
    Experience,
    /// Alphabetical.
    Name,
}

impl From<SortArg> for DoctorSort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Rating => DoctorSort::Rating,
            SortArg::Experience => DoctorSort::Experience,
            SortArg::Name => DoctorSort::Name,
        }
    }
}

#[derive(Subcommand)]
pub enum DoctorsAction {
    /// List and filter doctors.
    List {
        /// Match against name, specialty and specializations.
        #[arg(short, long)]
        query: Option<String>,
        /// Minimum years of experience.
        #[arg(short = 'x', long, default_value = "0")]
        min_experience: u32,
        /// Keep only these specialties (repeatable).
        #[arg(long = "specialty")]
        specialties: Vec<String>,
        /// Keep only these availability options (repeatable).
        #[arg(long)]
        availability: Vec<String>,
        #[arg(short, long, default_value = "rating")]
        sort: SortArg,
    },
    /// Show a doctor's full profile.
    Show {
        id: String,
    },
    /// Show bookable slots for a date (YYYY-MM-DD).
    Slots {
        id: String,
        date: String,
    },
    /// List dates in the booking window that cannot be booked.
    Unavailable {
        id: String,
    },
    /// Doctors suited to assessment concerns (e.g. "Depression").
    Recommend {
        concerns: Vec<String>,
    },
    /// List distinct specialties.
    Specialties,
    /// Link the signed-in doctor account to a directory entry.
    Link {
        id: String,
    },
}

fn print_doctors(doctors: &[Doctor], format: OutputFormat) -> ShResult<()> {
    match format {
        OutputFormat::Json => super::print_json(doctors),
        OutputFormat::Text => {
            if doctors.is_empty() {
                println!("No doctors match.");
                return Ok(());
            }
            let mut table = super::new_table(vec![
                "Id", "Name", "Specialty", "Exp", "Rating", "Availability", "Fee",
            ]);
            for d in doctors {
                let fee = if d.first_consult_free {
                    format!("₹{} (first free)", d.consultation_fee)
                } else {
                    format!("₹{}", d.consultation_fee)
                };
                table.add_row(vec![
                    d.id.clone(),
                    d.name.clone(),
                    d.specialty.clone(),
                    format!("{} yrs", d.experience),
                    format!("{:.1} ({})", d.rating, d.reviews),
                    d.availability.clone(),
                    fee,
                ]);
            }
            println!("{table}");
            Ok(())
        }
    }
}

pub async fn run(registry: &ServiceRegistry, action: DoctorsAction, format: OutputFormat) -> ShResult<()> {
    let directory = registry.directory();

    match action {
        DoctorsAction::List { query, min_experience, specialties, availability, sort } => {
            let filter = DoctorFilter {
                query,
                min_experience,
                specialties,
                availability,
                sort: sort.into(),
            };
            print_doctors(&directory.search(&filter)?, format)
        }
        DoctorsAction::Show { id } => {
            let doctor = directory.find(&id)?;
            match format {
                OutputFormat::Json => super::print_json(&doctor),
                OutputFormat::Text => {
                    println!("{}", style(&doctor.name).bold().underlined());
                    println!("  {} · {} years", doctor.specialty, doctor.experience);
                    println!("  Rating:         {:.1} from {} reviews", doctor.rating, doctor.reviews);
                    println!("  Availability:   {}", doctor.availability);
                    if let Some(next) = &doctor.next_available {
                        println!("  Next available: {next}");
                    }
                    println!("  Fee:            ₹{}", doctor.consultation_fee);
                    println!("  Languages:      {}", doctor.languages.join(", "));
                    println!("  Focus:          {}", doctor.specializations.join(", "));
                    println!();
                    println!("  {}", doctor.bio);
                    if !doctor.education.is_empty() {
                        println!();
                        println!("  {}", style("Education").bold());
                        for line in &doctor.education {
                            println!("    - {line}");
                        }
                    }
                    Ok(())
                }
            }
        }
        DoctorsAction::Slots { id, date } => {
            let date = super::parse_date(&date)?;
            let slots = registry.scheduling().time_slots(&id, date)?;
            match format {
                OutputFormat::Json => super::print_json(&slots),
                OutputFormat::Text => {
                    if slots.is_empty() {
                        println!("  No consultations on {} (closed).", date.format("%A, %B %-d"));
                    }
                    for slot in &slots {
                        if slot.available {
                            println!("  {}  {}", style("●").green(), slot.time);
                        } else {
                            let booked = format!("{} (booked)", slot.time);
                            println!("  {}  {}", style("○").dim(), style(booked).dim());
                        }
                    }
                    Ok(())
                }
            }
        }
        DoctorsAction::Unavailable { id } => {
            let today = Local::now().date_naive();
            let dates = registry.scheduling().unavailable_dates(&id, today)?;
            match format {
                OutputFormat::Json => super::print_json(&dates),
                OutputFormat::Text => {
                    for date in &dates {
                        println!("  {}", date.format("%a %Y-%m-%d"));
                    }
                    Ok(())
                }
            }
        }
        DoctorsAction::Recommend { concerns } => print_doctors(&directory.recommended(&concerns)?, format),
        DoctorsAction::Specialties => {
            let specialties = directory.specialties()?;
            match format {
                OutputFormat::Json => super::print_json(&specialties),
                OutputFormat::Text => {
                    for s in &specialties {
                        println!("  {s}");
                    }
                    Ok(())
                }
            }
        }
        DoctorsAction::Link { id } => {
            let user = registry.auth().require_role(Role::Doctor)?;
            let doctor = directory.link_account(&id, &user)?;
            println!(
                "  {} {} is now linked to {}.",
                style("OK").green().bold(),
                user.email,
                doctor.name
            );
            Ok(())
        }
    }
}
