use crate::Checker::consistency_checker::check_corpus;
use crate::Database::Complex::Complex;
use crate::Database::db_errors::DbError;
use crate::Database::db_iterator::DatabaseIterator;
use crate::Database::references::ReferenceStore;
use crate::Database::species_names::names_equivalent;
use crate::Thermodynamics::water_IAPWS95::{p_sat, rho, rho_sat, t_sat, water_phase};
use crate::database_config::DatabaseConfigManager;
use log::error;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub fn run_interactive_menu() {
    let mut manager = DatabaseConfigManager::new();
    loop {
        show_main_menu();
        let choice = get_user_input();

        match choice.trim() {
            "1" => check_menu(&manager),
            "2" => log_k_menu(&manager),
            "3" => water_menu(),
            "4" => config_menu(&mut manager),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
/* colors
Blue (\x1b[34m) - header text

Yellow (\x1b[33m) - menu options

Cyan (\x1b[36m) - prompts

Red (\x1b[31m) - errors

Reset (\x1b[0m) - back to normal after each colored section
*/
fn show_main_menu() {
    println!("\x1b[34m\n ChemEqDB: chemical equilibrium reaction databases \n\x1b[0m");
    println!("\x1b[33m1. Check database consistency\x1b[0m");
    println!("\x1b[33m2. logK of a species at T, P\x1b[0m");
    println!("\x1b[33m3. Water properties\x1b[0m");
    println!("\x1b[33m4. Configuration\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    prompt("Enter your choice: ");
}

fn prompt(text: &str) {
    print!("\x1b[36m{}\x1b[0m", text);
    let _ = io::stdout().flush();
}

fn get_user_input() -> String {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_line(&mut input) {
        error!("cannot read input: {}", e);
    }
    input
}

fn ask_number(text: &str, default: f64) -> f64 {
    prompt(&format!("{} [{}]: ", text, default));
    let input = get_user_input();
    let input = input.trim();
    if input.is_empty() {
        return default;
    }
    input.parse().unwrap_or_else(|_| {
        println!("'{}' is not a number, using {}", input, default);
        default
    })
}

fn show_error(e: &dyn std::fmt::Display) {
    println!("\x1b[31m{}\x1b[0m", e);
}

////////////////////////////////CHECK////////////////////////////////

fn check_menu(manager: &DatabaseConfigManager) {
    let config = manager.config();
    if config.database_files.is_empty() {
        println!("No database files configured (menu 4).");
        return;
    }
    let elements = match config.load_element_table() {
        Ok(t) => t,
        Err(e) => return show_error(&e),
    };
    let references = match config.load_references() {
        Ok(r) => r,
        Err(e) => return show_error(&e),
    };
    let store = references.as_ref().map(|r| r as &dyn ReferenceStore);
    match check_corpus(&config.database_files, elements.as_ref(), store) {
        Ok(report) => {
            report.pretty_print();
            prompt("Save the report as JSON (file name, empty to skip): ");
            let file = get_user_input();
            let file = file.trim();
            if file.is_empty() {
                return;
            }
            let written = report
                .to_json()
                .map_err(|e| e.to_string())
                .and_then(|json| fs::write(file, json).map_err(|e| e.to_string()));
            match written {
                Ok(()) => println!("Report written to {}", file),
                Err(e) => show_error(&e),
            }
        }
        Err(e) => show_error(&e),
    }
}

////////////////////////////////LOGK////////////////////////////////

/// The record of `name` in force after reading the whole corpus: a later record
/// replaces an earlier one and `@name` removes it.
pub fn find_species<P: AsRef<Path>>(files: &[P], name: &str) -> Result<Option<Complex>, DbError> {
    let mut found = None;
    for record in DatabaseIterator::new(files) {
        let record = record?;
        if let Some(target) = record.name.strip_prefix('@') {
            if names_equivalent(target, name) {
                found = None;
            }
        } else if names_equivalent(&record.name, name) {
            found = Some(record);
        }
    }
    Ok(found)
}

fn log_k_menu(manager: &DatabaseConfigManager) {
    let config = manager.config();
    prompt("Species: ");
    let name = get_user_input();
    let name = name.trim();
    let t_c = ask_number("Temperature, C", config.default_temperature_c);
    let p_bar = ask_number("Pressure, bar", config.default_pressure_bar);
    match find_species(&config.database_files, name) {
        Ok(Some(c)) => {
            println!("{}", c.reaction_text_with_log_k(t_c, p_bar));
            let log_k = c.log_k_at_t_and_p(t_c, p_bar);
            if log_k.is_nan() {
                println!("logK is not defined at {} C, {} bar (tMax = {} C)", t_c, p_bar, c.t_max);
            }
        }
        Ok(None) => println!("{} not found", name),
        Err(e) => show_error(&e),
    }
}

////////////////////////////////WATER////////////////////////////////

/// saturation and density of water at (T, P) as printable lines
pub fn water_report(t_c: f64, p_bar: f64) -> Vec<String> {
    let mut lines = vec![format!("T = {} C, P = {} bar: {}", t_c, p_bar, water_phase(t_c, p_bar))];
    match (p_sat(t_c), rho_sat(t_c)) {
        (Ok(p), Ok(r)) => lines.push(format!(
            "saturation: P = {:.5} bar, liquid density = {:.5} g/cm3",
            p, r
        )),
        (Err(e), _) | (_, Err(e)) => lines.push(format!("saturation: {}", e)),
    }
    match t_sat(p_bar) {
        Ok(t) => lines.push(format!("boiling temperature at {} bar: {:.3} C", p_bar, t)),
        Err(e) => lines.push(format!("boiling temperature: {}", e)),
    }
    match rho(t_c, p_bar) {
        Ok(d) => lines.push(format!("density = {:.3} kg/m3", d)),
        Err(e) => lines.push(format!("density: {}", e)),
    }
    lines
}

fn water_menu() {
    let t_c = ask_number("Temperature, C", 25.0);
    let p_bar = ask_number("Pressure, bar", 1.01325);
    for line in water_report(t_c, p_bar) {
        println!("{}", line);
    }
}

////////////////////////////////CONFIG////////////////////////////////

fn config_menu(manager: &mut DatabaseConfigManager) {
    loop {
        println!("\x1b[34mConfiguration file: {}\x1b[0m", manager.config_file());
        for (i, f) in manager.config().database_files.iter().enumerate() {
            println!("  {}. {}", i + 1, f);
        }
        println!("\x1b[33m1. Add database file\x1b[0m");
        println!("\x1b[33m2. Remove database file\x1b[0m");
        println!("\x1b[33m3. Set default T and P\x1b[0m");
        println!("\x1b[33m4. Reset to defaults\x1b[0m");
        println!("\x1b[33m0. Back\x1b[0m");
        prompt("Enter your choice: ");
        let result = match get_user_input().trim() {
            "1" => {
                prompt("File: ");
                manager.add_database_file(get_user_input().trim())
            }
            "2" => {
                prompt("File: ");
                manager.remove_database_file(get_user_input().trim())
            }
            "3" => {
                let config = manager.config();
                let t_c = ask_number("Temperature, C", config.default_temperature_c);
                let p_bar = ask_number("Pressure, bar", config.default_pressure_bar);
                manager.set_default_state(t_c, p_bar)
            }
            "4" => manager.reset_to_defaults(),
            "0" => break,
            _ => {
                println!("Invalid choice. Please try again.");
                Ok(())
            }
        };
        if let Err(e) = result {
            show_error(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database::complex_text::{TEXT_HEADER, encode_record};
    use tempfile::tempdir;

    #[test]
    fn test_find_species_follows_overrides() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        let old = Complex::new("FeOH+").with_constant(-9.5).with_reactant("Fe+2", 1.0);
        let new = Complex::new("FeOH+").with_constant(-9.0).with_reactant("Fe+2", 1.0);
        let marker = Complex::new("@FeOH+");
        fs::write(&first, format!("{}\n{}\n", TEXT_HEADER, encode_record(&old))).unwrap();
        fs::write(&second, format!("{}\n{}\n", TEXT_HEADER, encode_record(&new))).unwrap();

        let found = find_species(&[&first, &second], "FeOH+").unwrap().unwrap();
        assert_eq!(found.constant, Some(-9.0));
        assert!(find_species(&[&first], "Fe(OH)2").unwrap().is_none());

        fs::write(&second, format!("{}\n{}\n", TEXT_HEADER, encode_record(&marker))).unwrap();
        assert!(find_species(&[&first, &second], "FeOH+").unwrap().is_none());
    }

    #[test]
    fn test_water_report() {
        let lines = water_report(25.0, 1.01325);
        assert!(lines[0].ends_with("liquid"));
        assert!(lines[1].starts_with("saturation: P = 0.0317"));
        assert!(lines[3].starts_with("density = 997.0"));

        let lines = water_report(-20.0, 1.0);
        assert!(lines[0].ends_with("ice Ih"));
        assert!(lines[3].starts_with("density:"));
    }
}
