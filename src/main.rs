// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fiducia_client::auth::{LoginOutcome, RestoreOutcome, Role, RoleOutcome};
use fiducia_client::blockchain::{Wallet, A3A_TOKEN, PYUSD_TOKEN};
use fiducia_client::config::ClientConfig;
use fiducia_client::error::ClientError;
use fiducia_client::logging;
use fiducia_client::models::{ChatMessage, ChatReply};
use fiducia_client::orders::completed_revenue;
use fiducia_client::payment::{format_amount, parse_amount, FlowSnapshot, PaymentFlow};
use fiducia_client::state::AppState;

#[derive(Parser)]
#[command(name = "fiducia", version, about = "Fiducia wallet client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show wallet, chain and session
    Status,
    /// Sign in with the configured wallet
    Login,
    /// Choose a role: customer or merchant
    Role { role: String },
    /// Mint the merchant NFT and finish a pending merchant role selection
    MintCredential,
    /// Forget the session
    Logout,
    /// Buy A3A with PYUSD
    Buy {
        #[arg(long)]
        pyusd: String,
    },
    /// Approve PYUSD and A3A for the order contract
    ApproveOrder {
        #[arg(long)]
        pyusd: String,
        #[arg(long)]
        a3a: String,
    },
    /// List your orders
    Orders,
    /// Confirm an order was delivered
    Confirm { order_id: String },
    /// Raise a dispute for an order
    Dispute {
        order_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Send a message to the ordering assistant
    Chat {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show the merchant profile
    Profile,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.log_format);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind(), "Command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: ClientConfig) -> Result<(), ClientError> {
    let state = AppState::connect(config).await?;
    let restored = state.auth.restore_session();

    match command {
        Command::Status => print_status(&state, restored),
        Command::Login => match state.auth.login().await? {
            LoginOutcome::Authenticated(role) => println!("Signed in as {role}"),
            LoginOutcome::RoleSelectionRequired => {
                println!("Signed in. Choose a role with `fiducia role customer|merchant`.")
            }
            LoginOutcome::CredentialRequired => println!(
                "Signed in. Run `fiducia mint-credential` to finish registering as a merchant."
            ),
        },
        Command::Role { role } => {
            let role = Role::from_str(&role).ok_or_else(|| {
                ClientError::InvalidInput(format!("Unknown role {role:?}, use customer or merchant"))
            })?;
            print_role_outcome(state.auth.set_role(role).await?);
        }
        Command::MintCredential => print_role_outcome(state.auth.mint_merchant_credential().await?),
        Command::Logout => {
            state.auth.logout().await;
            println!("Logged out");
        }
        Command::Buy { pyusd } => {
            let required = parse_amount(&pyusd, PYUSD_TOKEN.decimals)?;
            let flow = PaymentFlow::token_purchase(required)
                .on_settled(|hash| println!("Purchase settled in {hash}"));

            state.payments.fetch_contract_addresses().await?;
            state.payments.refresh_allowances(&flow).await?;
            state.payments.approve_all(&flow).await?;
            state.payments.buy_token(&flow, &pyusd).await?;
        }
        Command::ApproveOrder { pyusd, a3a } => {
            let flow = PaymentFlow::order_payment(
                parse_amount(&pyusd, PYUSD_TOKEN.decimals)?,
                parse_amount(&a3a, A3A_TOKEN.decimals)?,
            );

            state.payments.fetch_contract_addresses().await?;
            state.payments.refresh_allowances(&flow).await?;
            state.payments.approve_all(&flow).await?;
            print_approvals(&flow.snapshot());
        }
        Command::Orders => {
            let orders = state.backend.list_orders(&state.token()?).await?;
            if orders.is_empty() {
                println!("No orders yet");
            }
            for order in &orders {
                let actionable = if order.status.can_take_action() { " *" } else { "" };
                println!(
                    "{:<10} {:<22} {}{actionable}",
                    order.order_id,
                    order.status.as_str(),
                    order.amount
                );
            }
            if state.auth.session().role() == Some(Role::Merchant) {
                println!("Completed revenue: {:.2} PYUSD", completed_revenue(&orders));
            }
        }
        Command::Confirm { order_id } => {
            let resp = state.backend.confirm_order(&state.token()?, &order_id).await?;
            println!("{}", resp.message.unwrap_or_else(|| "Order confirmed".to_string()));
        }
        Command::Dispute { order_id, reason } => {
            let resp = state
                .backend
                .dispute_order(&state.token()?, &order_id, &reason)
                .await?;
            println!("{}", resp.message.unwrap_or_else(|| "Dispute raised".to_string()));
        }
        Command::Chat { text } => {
            let message = ChatMessage::user(text.join(" "));
            match state.backend.send_chat(&state.token()?, vec![message]).await? {
                ChatReply::Text(text) => println!("{text}"),
                ChatReply::Order(order) => {
                    println!("Proposed order:");
                    for item in &order.items {
                        println!(
                            "  {} x{} {}",
                            item.name,
                            item.quantity.unwrap_or(1),
                            item.price.as_deref().unwrap_or("")
                        );
                    }
                    if let Some(total) = &order.total {
                        println!("Total: {total}");
                    }
                }
            }
        }
        Command::Profile => {
            let session = state.auth.session();
            let merchant_id = session
                .merchant_id()
                .ok_or_else(|| ClientError::InvalidInput("Only merchants have a profile".into()))?;
            match state.backend.merchant_profile(&state.token()?, merchant_id).await? {
                Some(profile) => {
                    println!("Merchant {}", profile.merchant_id);
                    println!("  wallet:      {}", profile.wallet);
                    println!("  description: {}", profile.description);
                    println!("  hours:       {}", profile.hours);
                    println!("  location:    {}", profile.location);
                    println!("  menu items:  {}", profile.menu.len());
                    if !profile.is_complete() {
                        println!("Profile is incomplete");
                    }
                }
                None => println!("No profile yet"),
            }
        }
    }
    Ok(())
}

fn print_status(state: &AppState, restored: RestoreOutcome) {
    let session = state.auth.session();
    println!(
        "wallet:  {}",
        state
            .wallet
            .address()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "not connected".to_string())
    );
    println!(
        "chain:   {}",
        state
            .wallet
            .chain_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "not detected".to_string())
    );
    println!("auth:    {:?}", state.auth.state());
    println!("restore: {restored:?}");
    if session.is_authenticated() {
        println!(
            "role:    {}",
            session
                .role()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "not chosen".to_string())
        );
        if let Some(id) = session.merchant_id() {
            println!("merchant id: {id}");
        }
    }
    if let Some(role) = state.auth.pending_role() {
        println!("pending role: {role} (merchant NFT required)");
    }
}

fn print_role_outcome(outcome: RoleOutcome) {
    match outcome {
        RoleOutcome::Set(role) => println!("Role set to {role}"),
        RoleOutcome::CredentialRequired => println!(
            "A merchant NFT is required. Run `fiducia mint-credential` to mint it."
        ),
    }
}

fn print_approvals(snapshot: &FlowSnapshot) {
    for approval in &snapshot.approvals {
        let decimals = approval.token.token_info().map_or(18, |t| t.decimals);
        println!(
            "{:<6} {:?} (required {})",
            approval.token.to_string(),
            approval.state,
            format_amount(approval.required, decimals)
        );
    }
}
