use crate::infra::{farm_service, SharedFarmService};
use aquafarm::config::{AdminSeed, FarmConfig};
use aquafarm::error::AppError;
use aquafarm::farm::report::views::FarmAlert;
use aquafarm::farm::{
    Actor, Cage, CompanyRegistration, DailyRecordInput, DashboardReport, FarmError, FeedLogImport,
    HarvestInput, HarvestKind, NewCage, NewUser, SampleInput, StockingRequest, UserRole,
};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use std::fs::File;
use std::path::PathBuf;

const CYCLE_DAYS: i64 = 60;
const SAMPLE_EVERY_DAYS: i64 = 14;
const SAMPLE_SIZE: u32 = 30;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Feed log CSV to import into the second cage instead of generated logs.
    #[arg(long)]
    pub(crate) feed_csv: Option<PathBuf>,
}

struct DemoFarm {
    service: SharedFarmService,
    manager: Actor,
    operator: Actor,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let farm = seed_farm(today)?;
    let stocked_on = today - Duration::days(CYCLE_DAYS);

    let north = stock_cage(&farm, "North Pen 1", 5_000, 8.0, stocked_on)?;
    let south = stock_cage(&farm, "South Pen 2", 3_000, 12.0, stocked_on)?;

    let top_up = farm.service.request_top_up(
        &farm.operator,
        &north.id,
        StockingRequest {
            fish_count: 400,
            average_weight_g: 8.0,
            stocking_date: stocked_on + Duration::days(3),
            species: None,
            source: Some("Bay Hatchery".to_string()),
            notes: Some("replacing transport losses".to_string()),
        },
    )?;
    farm.service.approve_stocking(&farm.manager, &top_up.id)?;

    log_cycle(&farm, &north, stocked_on, today, 8.0)?;
    let import = match &args.feed_csv {
        Some(path) => {
            let file = File::open(path)?;
            Some(
                farm.service
                    .import_daily_csv(&farm.operator, &south.id, file)?,
            )
        }
        None => {
            log_cycle(&farm, &south, stocked_on, today, 12.0)?;
            None
        }
    };

    let overview = farm.service.cage_overview(&farm.manager, &north.id, None)?;
    let harvest_abw = overview
        .metrics
        .as_ref()
        .map_or(8.0, |metrics| metrics.latest_abw_g);
    farm.service.record_harvest(
        &farm.operator,
        &north.id,
        HarvestInput {
            date: today,
            kind: HarvestKind::Partial,
            fish_count: 1_000,
            total_weight_kg: 1_000.0 * harvest_abw / 1000.0,
            buyer: Some("Harbor Co-op".to_string()),
            notes: None,
        },
    )?;

    let dashboard = farm.service.dashboard(&farm.manager, None)?;
    render_dashboard(&dashboard, import.as_ref());
    Ok(())
}

fn seed_farm(today: NaiveDate) -> Result<DemoFarm, FarmError> {
    let service = farm_service(&FarmConfig::default(), Some(today));
    let admin = service.bootstrap_admin(&AdminSeed {
        full_name: "Platform Admin".to_string(),
        email: "admin@aquafarm.demo".to_string(),
    })?;
    let admin = service.authenticate(&admin.id)?;

    let receipt = service.register_company(CompanyRegistration {
        company_name: "Tidewater Mariculture".to_string(),
        contact_email: "office@tidewater.demo".to_string(),
        manager_name: "Rosa Dela Cruz".to_string(),
        manager_email: "rosa@tidewater.demo".to_string(),
    })?;
    service.approve_company(&admin, &receipt.company.id)?;
    let manager = service.authenticate(&receipt.manager.id)?;

    let operator = service.create_user(
        &manager,
        NewUser {
            full_name: "Ben Aquino".to_string(),
            email: "ben@tidewater.demo".to_string(),
            role: UserRole::Operator,
            company_id: None,
        },
    )?;
    let operator = service.authenticate(&operator.id)?;

    Ok(DemoFarm {
        service,
        manager,
        operator,
    })
}

fn stock_cage(
    farm: &DemoFarm,
    name: &str,
    fish_count: u32,
    average_weight_g: f64,
    stocked_on: NaiveDate,
) -> Result<Cage, FarmError> {
    let cage = farm.service.create_cage(
        &farm.manager,
        NewCage {
            name: name.to_string(),
            location: Some("Outer reef".to_string()),
            volume_m3: Some(800.0),
            capacity: Some(8_000),
            company_id: None,
        },
    )?;
    let request = farm.service.request_stocking(
        &farm.operator,
        &cage.id,
        StockingRequest {
            fish_count,
            average_weight_g,
            stocking_date: stocked_on,
            species: Some("Milkfish".to_string()),
            source: Some("Bay Hatchery".to_string()),
            notes: None,
        },
    )?;
    farm.service.approve_stocking(&farm.manager, &request.id)?;
    farm.service.get_cage(&farm.manager, &cage.id)
}

/// Daily feeding up to yesterday plus a growth sample every two weeks.
fn log_cycle(
    farm: &DemoFarm,
    cage: &Cage,
    stocked_on: NaiveDate,
    today: NaiveDate,
    stocked_abw_g: f64,
) -> Result<(), FarmError> {
    let mut date = stocked_on;
    while date < today {
        let doc = (date - stocked_on).num_days();
        farm.service.record_daily(
            &farm.operator,
            &cage.id,
            DailyRecordInput {
                date,
                feed_kg: 4.0 + doc as f64 * 0.5,
                feed_type: Some(feed_type(doc).to_string()),
                mortality: if doc % 7 == 0 { 6 } else { 2 },
                water_temp_c: Some(28.5),
                dissolved_oxygen_mg_l: Some(5.8),
                notes: None,
            },
        )?;

        if doc > 0 && doc % SAMPLE_EVERY_DAYS == 0 {
            let abw_g = stocked_abw_g + doc as f64 * 1.6;
            farm.service.record_sample(
                &farm.operator,
                &cage.id,
                SampleInput {
                    date,
                    sample_count: SAMPLE_SIZE,
                    sample_weight_kg: abw_g * f64::from(SAMPLE_SIZE) / 1000.0,
                    notes: None,
                },
            )?;
        }
        date += Duration::days(1);
    }
    Ok(())
}

fn feed_type(doc: i64) -> &'static str {
    if doc < 30 {
        "Starter 2mm"
    } else {
        "Grower 3mm"
    }
}

fn render_dashboard(report: &DashboardReport, import: Option<&FeedLogImport>) {
    println!("Aquafarm demo dashboard");
    println!(
        "Report date: {} (recent window {} days)",
        report.today, report.window_days
    );

    if let Some(import) = import {
        println!(
            "Feed log import for {}: {} row(s) imported, {} rejected",
            import.cage_id,
            import.imported.len(),
            import.rejected.len()
        );
        for row in &import.rejected {
            println!("  line {}: {}", row.line, row.reason);
        }
    }

    println!("\nCages by status");
    for bucket in report.status_counts.iter().filter(|bucket| bucket.count > 0) {
        println!("  {:<12} {}", bucket.status_label, bucket.count);
    }

    println!("\nFarm totals");
    println!("  Active cages:      {}", report.active_cages);
    println!("  Fish on hand:      {}", report.total_fish);
    println!("  Standing biomass:  {:.1} kg", report.total_biomass_kg);
    println!("  Feed to date:      {:.1} kg", report.total_feed_kg);
    println!("  Recent feed:       {:.1} kg", report.recent_feed_kg);
    println!("  Recent mortality:  {}", report.recent_mortality);
    match report.average_fcr {
        Some(fcr) => println!("  Average FCR:       {fcr:.2}"),
        None => println!("  Average FCR:       n/a"),
    }
    println!("  Pending approvals: {}", report.pending_approvals);

    println!("\nCages");
    for row in &report.cages {
        println!(
            "  {:<14} {:<11} DOC {:>3}  fish {:>6}  biomass {:>8.1} kg  ABW {:>6}  FCR {}",
            row.name,
            row.status_label,
            row.days_of_culture
                .map_or_else(|| "-".to_string(), |doc| doc.to_string()),
            row.fish,
            row.biomass_kg,
            row.abw_g
                .map_or_else(|| "-".to_string(), |abw| format!("{abw:.1} g")),
            row.fcr.map_or_else(|| "-".to_string(), |fcr| format!("{fcr:.2}")),
        );
    }

    if report.recent_harvests.is_empty() {
        println!("\nRecent harvests: none");
    } else {
        println!("\nRecent harvests");
        for harvest in &report.recent_harvests {
            println!(
                "  {} {}: {} fish, {:.1} kg",
                harvest.date, harvest.cage_name, harvest.fish_count, harvest.total_weight_kg
            );
        }
    }

    render_alerts(&report.alerts);
}

fn render_alerts(alerts: &[FarmAlert]) {
    if alerts.is_empty() {
        println!("\nAlerts: none");
        return;
    }
    println!("\nAlerts");
    for alert in alerts {
        println!(
            "  [{}] {} / {}: {}",
            alert.severity_label, alert.cage_name, alert.topic, alert.detail
        );
    }
}
