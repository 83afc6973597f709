//! Main entry point for the swap client.
//!
//! Loads the configuration, wires the swap pipeline with the RPC and order
//! book clients, and either runs a full swap or inspects an existing order.
//! Ctrl-C interrupts order monitoring. Before an order has been placed it
//! terminates the process instead.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swap_account::implementations::local::create_account;
use swap_config::Config;
use swap_core::{
	InterruptHandle, MonitorReport, SwapBuilder, SwapFactories, SwapPipeline, SwapReport,
	SwapRequest,
};
use swap_delivery::implementations::evm::alloy::create_http_delivery;
use swap_orderbook::implementations::http::create_http_orderbook;
use swap_types::constants::{ORDER_EXPLORER_URL, TX_EXPLORER_URL};
use swap_types::{format_valid_to, truncate_id, OrderDetails, SwapEvent};
use tokio::sync::broadcast;

/// Command-line arguments for the swap client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/swap.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Quote, approve, sign, submit and monitor the configured swap (default)
	Run,
	/// Fetch the current status of an order once
	Status { order_id: String },
	/// Monitor an existing order until it settles or the timeout elapses
	Monitor { order_id: String },
}

/// What a command produced, printed once the event log is flushed.
enum Output {
	Swap(SwapReport),
	Details(OrderDetails),
	Monitor(MonitorReport),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	dotenv::dotenv().ok();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!(
		chain_id = config.network.chain_id,
		orderbook = %config.orderbook.api_url,
		"Loaded configuration"
	);

	let pipeline = build_pipeline(config.clone())?;

	tokio::spawn(handle_interrupts(pipeline.interrupt_handle()));
	let printer = tokio::spawn(print_events(pipeline.event_bus().subscribe()));

	let command = args.command.unwrap_or(Command::Run);
	let result = execute(&pipeline, command, &config).await;

	// Closing the bus lets the printer drain the remaining events, also when
	// the command failed.
	drop(pipeline);
	printer.await.ok();

	match result? {
		Output::Swap(report) => print_swap_report(&report),
		Output::Details(details) => print_details(&details),
		Output::Monitor(report) => print_monitor_report(&report),
	}
	Ok(())
}

async fn execute(
	pipeline: &SwapPipeline,
	command: Command,
	config: &Config,
) -> Result<Output, Box<dyn std::error::Error>> {
	Ok(match command {
		Command::Run => Output::Swap(pipeline.run(&SwapRequest::from(&config.swap)).await?),
		Command::Status { order_id } => Output::Details(pipeline.status(&order_id).await?),
		Command::Monitor { order_id } => {
			Output::Monitor(pipeline.monitor_existing(&order_id).await)
		},
	})
}

/// Stops a running monitor on Ctrl-C. With no order being monitored the
/// stages in flight cannot be interrupted, so the process exits.
async fn handle_interrupts(interrupt: InterruptHandle) {
	while tokio::signal::ctrl_c().await.is_ok() {
		if interrupt.interrupt().await {
			tracing::warn!("Interrupt received, stopping monitor");
		} else {
			tracing::warn!("Interrupt received before an order was placed, exiting");
			std::process::exit(130);
		}
	}
}

/// Wires the pipeline with the production implementations.
fn build_pipeline(config: Config) -> Result<SwapPipeline, Box<dyn std::error::Error>> {
	let factories = SwapFactories {
		account_factory: create_account,
		delivery_factory: create_http_delivery,
		orderbook_factory: create_http_orderbook,
	};
	Ok(SwapBuilder::new(config).build(factories)?)
}

/// Logs lifecycle events as they are published.
async fn print_events(mut events: broadcast::Receiver<SwapEvent>) {
	loop {
		match events.recv().await {
			Ok(SwapEvent::QuoteReceived {
				fee_amount,
				buy_amount,
				valid_to,
			}) => {
				tracing::info!(
					%fee_amount,
					%buy_amount,
					valid_to = %format_valid_to(valid_to),
					"Quote received"
				);
			},
			Ok(SwapEvent::AllowanceDecision { issued }) => {
				tracing::info!(issued, "Allowance decision");
			},
			Ok(SwapEvent::OrderSigned) => tracing::info!("Order signed"),
			Ok(SwapEvent::OrderSubmitted { order_id }) => {
				tracing::info!(order_id = %truncate_id(&order_id), "Order submitted");
			},
			Ok(SwapEvent::StatusUpdate { status }) => {
				tracing::info!(%status, "Status update");
			},
			Ok(SwapEvent::MonitorTerminal { outcome }) => {
				tracing::info!(%outcome, "Monitoring finished");
			},
			Ok(SwapEvent::MonitorTimeout) => tracing::warn!("Monitoring timed out"),
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				tracing::warn!(skipped, "Event printer lagged");
			},
			Err(broadcast::error::RecvError::Closed) => break,
		}
	}
}

fn print_swap_report(report: &SwapReport) {
	println!("Owner:           {}", report.owner);
	println!("Approval issued: {}", report.approval_issued);
	println!("Sell amount:     {}", report.signed_order.order.sell_amount);
	println!("Buy amount:      {}", report.signed_order.order.buy_amount);
	println!("Quoted fee:      {}", report.quote.fee_amount);
	if let Some(valid_until) = report.quote.valid_until() {
		println!("Valid to:        {}", valid_until);
	}
	println!("Signed fee:      {}", report.signed_order.order.fee_amount);
	println!("Signature:       {}", report.signed_order.signature_hex());
	println!("Order id:        {}", report.order_id);
	println!("Track it at:     {}{}", ORDER_EXPLORER_URL, report.order_id);
	print_monitor_report(&report.monitor);
}

fn print_monitor_report(report: &MonitorReport) {
	println!("Outcome:         {} after {} fetch(es)", report.outcome, report.fetches);
	if let Some(error) = &report.error {
		println!("Error:           {}", error);
	}
	if let Some(details) = &report.last_details {
		print_details(details);
	}
}

fn print_details(details: &OrderDetails) {
	for line in details_lines(details) {
		println!("{}", line);
	}
}

fn details_lines(details: &OrderDetails) -> Vec<String> {
	let mut lines = vec![
		field("Order", &details.uid),
		field("Status", &details.status),
	];
	if let Some(created) = &details.creation_date {
		lines.push(field("Created", created));
	}
	if let Some(token) = details.sell_token {
		lines.push(field("Sell token", token));
	}
	if let Some(token) = details.buy_token {
		lines.push(field("Buy token", token));
	}
	let amounts = [
		("Sell amount", details.sell_amount),
		("Buy amount", details.buy_amount),
		("Fee amount", details.fee_amount),
		("Executed sell", details.executed_sell_amount),
		("Executed buy", details.executed_buy_amount),
		("Executed fee", details.executed_fee_amount),
	];
	for (label, amount) in amounts {
		if let Some(amount) = amount {
			lines.push(field(label, amount));
		}
	}
	if let Some(valid_until) = details.valid_until() {
		lines.push(field("Valid to", valid_until));
	}
	if let Some(tx_hash) = &details.tx_hash {
		lines.push(field("Settlement tx", format!("{}{}", TX_EXPLORER_URL, tx_hash)));
	}
	lines
}

fn field(label: &str, value: impl std::fmt::Display) -> String {
	format!("{:<17}{}", format!("{}:", label), value)
}
