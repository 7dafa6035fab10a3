use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use property_doctor::collaborators::{
    ComparableSalesValuation, DeclaredConditionVision, InsulationQuality, TrendTableForecaster,
    WindowGlazing,
};
use property_doctor::config::AppConfig;
use property_doctor::diagnosis::{
    DiagnosisConfig, DiagnosisOrchestrator, DiagnosisReport, DiagnosisRequest, DpeClass,
    EnergyConsumption, EnergyMixPolicy, OrchestratorConfig, PropertyFacts,
};
use property_doctor::error::AppError;
use property_doctor::telemetry;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

type DemoOrchestrator =
    DiagnosisOrchestrator<DeclaredConditionVision, ComparableSalesValuation, TrendTableForecaster>;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    orchestrator: Arc<DemoOrchestrator>,
}

#[derive(Parser, Debug)]
#[command(
    name = "Property Doctor",
    about = "Recalculate DPE classifications under the 2026 decree and synthesize investment recommendations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a full diagnosis from the command line
    Diagnose(DiagnoseArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct DiagnoseArgs {
    /// Property address used in the report and by the collaborators
    #[arg(long, default_value = "12 rue de la Paix, 75002 Paris")]
    address: String,
    /// Habitable surface in m²
    #[arg(long)]
    surface: f64,
    /// Heating consumption (kWh/m²/year)
    #[arg(long, default_value_t = 0.0)]
    heating: f64,
    /// Hot-water consumption (kWh/m²/year)
    #[arg(long, default_value_t = 0.0)]
    hot_water: f64,
    /// Cooling consumption (kWh/m²/year)
    #[arg(long, default_value_t = 0.0)]
    cooling: f64,
    /// Lighting consumption (kWh/m²/year)
    #[arg(long, default_value_t = 0.0)]
    lighting: f64,
    /// Auxiliary consumption: ventilation, pumps (kWh/m²/year)
    #[arg(long, default_value_t = 0.0)]
    auxiliary: f64,
    /// Share of consumption supplied by electricity (0-1)
    #[arg(long, default_value_t = 1.0)]
    electricity_share: f64,
    /// Share supplied by gas (0-1)
    #[arg(long, default_value_t = 0.0)]
    gas_share: f64,
    /// Share supplied by fuel oil (0-1)
    #[arg(long, default_value_t = 0.0)]
    fuel_oil_share: f64,
    /// Share supplied by wood (0-1)
    #[arg(long, default_value_t = 0.0)]
    wood_share: f64,
    /// Original ADEME classification (A-G), if a diagnostic exists
    #[arg(long, value_parser = parse_class)]
    original_class: Option<DpeClass>,
    /// Original primary-energy intensity (kWh EP/m²/year)
    #[arg(long)]
    original_intensity: Option<f64>,
    /// Reference date for compliance deadlines (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Declared insulation quality fed to the demo vision collaborator
    #[arg(long, default_value = "average", value_parser = parse_insulation)]
    insulation: InsulationQuality,
    /// Declared window glazing fed to the demo vision collaborator
    #[arg(long, default_value = "double", value_parser = parse_glazing)]
    glazing: WindowGlazing,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Diagnose(args) => run_diagnose(args).await,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn parse_class(raw: &str) -> Result<DpeClass, String> {
    raw.parse::<DpeClass>().map_err(|err| err.to_string())
}

fn parse_insulation(raw: &str) -> Result<InsulationQuality, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "poor" => Ok(InsulationQuality::Poor),
        "average" => Ok(InsulationQuality::Average),
        "good" => Ok(InsulationQuality::Good),
        "excellent" => Ok(InsulationQuality::Excellent),
        other => Err(format!(
            "'{other}' is not an insulation quality (poor|average|good|excellent)"
        )),
    }
}

fn parse_glazing(raw: &str) -> Result<WindowGlazing, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "single" => Ok(WindowGlazing::Single),
        "double" => Ok(WindowGlazing::Double),
        "triple" => Ok(WindowGlazing::Triple),
        other => Err(format!(
            "'{other}' is not a glazing type (single|double|triple)"
        )),
    }
}

fn demo_orchestrator(
    timeouts: OrchestratorConfig,
    vision: DeclaredConditionVision,
) -> Result<DemoOrchestrator, AppError> {
    let config = DiagnosisConfig {
        orchestrator: timeouts,
        ..DiagnosisConfig::default()
    };
    DiagnosisOrchestrator::new(
        config,
        Arc::new(vision),
        Arc::new(ComparableSalesValuation::default()),
        Arc::new(TrendTableForecaster::default()),
    )
    .map_err(AppError::from)
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/diagnosis", post(diagnosis_endpoint))
        .with_state(state)
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let orchestrator = demo_orchestrator(config.orchestrator, DeclaredConditionVision::default())?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
        orchestrator: Arc::new(orchestrator),
    };

    let app = app_router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "property doctor ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_diagnose(args: DiagnoseArgs) -> Result<(), AppError> {
    let mut other_carriers = BTreeMap::new();
    for (carrier, share) in [
        ("gas", args.gas_share),
        ("fuel_oil", args.fuel_oil_share),
        ("wood", args.wood_share),
    ] {
        if share > 0.0 {
            other_carriers.insert(carrier.to_string(), share);
        }
    }

    let request = DiagnosisRequest {
        property: PropertyFacts {
            address: args.address,
            surface_m2: args.surface,
            postal_code: None,
            photo_reference: None,
        },
        consumption: EnergyConsumption {
            heating: args.heating,
            hot_water: args.hot_water,
            cooling: args.cooling,
            lighting: args.lighting,
            auxiliary: args.auxiliary,
        },
        energy_mix: EnergyMixPolicy {
            electricity_share: args.electricity_share,
            other_carriers,
        },
        original_classification: args.original_class,
        original_intensity: args.original_intensity,
        today: args.today,
    };

    let orchestrator = demo_orchestrator(
        OrchestratorConfig::default(),
        DeclaredConditionVision {
            insulation: args.insulation,
            glazing: args.glazing,
        },
    )?;

    let report = orchestrator.diagnose(&request).await?;
    render_diagnosis_report(&request, &report);
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn diagnosis_endpoint(
    State(state): State<AppState>,
    Json(request): Json<DiagnosisRequest>,
) -> Result<Json<DiagnosisReport>, AppError> {
    let report = state.orchestrator.diagnose(&request).await?;
    Ok(Json(report))
}

fn render_diagnosis_report(request: &DiagnosisRequest, report: &DiagnosisReport) {
    let recalculation = &report.recalculation;
    let recommendation = &report.recommendation;

    println!("Property diagnosis");
    println!(
        "Address: {} ({} m²)",
        request.property.address, request.property.surface_m2
    );

    println!("\nDPE recalculation");
    println!(
        "- Original: {} ({:.1} kWh EP/m²/year)",
        recalculation.original_classification, recalculation.original_intensity
    );
    println!(
        "- Recalculated: {} ({:.1} kWh EP/m²/year)",
        recalculation.recalculated_classification, recalculation.recalculated_intensity
    );
    match (
        recalculation.is_restricted,
        recalculation.restriction_effective_date,
    ) {
        (true, Some(date)) => println!("- Rental restriction effective {date}"),
        (false, Some(date)) => println!("- No restriction today; calendar date {date}"),
        _ => println!("- No rental restriction"),
    }

    println!("\nFinancial impact");
    println!(
        "- Annual energy cost: {:.0} EUR",
        recalculation.annual_energy_cost
    );
    println!("- Value loss: {:.1}%", recalculation.value_loss_percent);
    if recalculation.renovation_cost_max > 0.0 {
        println!(
            "- Renovation budget: {:.0}-{:.0} EUR",
            recalculation.renovation_cost_min, recalculation.renovation_cost_max
        );
    } else {
        println!("- Renovation budget: none required");
    }

    println!("\nRecommendation");
    println!(
        "- Verdict: {} (score {:.1}/100)",
        recommendation.verdict.label(),
        recommendation.overall_score
    );
    println!(
        "- Risk: {:?}, opportunity: {:?}",
        recommendation.risk_tier, recommendation.opportunity_tier
    );
    for reason in &recommendation.key_reasons {
        println!("  * {reason}");
    }

    println!("\nAction plan");
    for step in &recommendation.action_plan {
        let cost = step
            .cost
            .map(|cost| format!("{cost:.0} EUR"))
            .unwrap_or_else(|| "-".to_string());
        let duration = step
            .duration_days
            .map(|days| format!("{days} day(s)"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}. {} [{:?}] cost {} duration {}",
            step.rank, step.title, step.priority, cost, duration
        );
    }

    if report.degraded_signals.is_empty() {
        println!(
            "\nAll external signals available (confidence: {:?})",
            report.confidence
        );
    } else {
        let degraded: Vec<String> = report
            .degraded_signals
            .iter()
            .map(|kind| kind.to_string())
            .collect();
        println!(
            "\nDegraded signals: {} (confidence: {:?})",
            degraded.join(", "),
            report.confidence
        );
    }
}
