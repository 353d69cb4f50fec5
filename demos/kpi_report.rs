use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    ta_cockpit::cli_apps::run_kpi_report(std::env::args().skip(1))
}
