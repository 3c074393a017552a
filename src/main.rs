use chrono::NaiveDate;
use quotegreeks::config::AppConfig;
use quotegreeks::feeds::risk_free_curve;
use quotegreeks::market::chain::DATE_FORMAT;
use quotegreeks::market::{fetch_option, ChainRequest, Stock};
use quotegreeks::models::OptionKind;
use quotegreeks::yahoo::YahooClient;

const USAGE: &str = "usage: quotegreeks TICKER [call|put DD-MM-YYYY STRIKE] [--strict]";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let mut strict = false;
    let args: Vec<String> = std::env::args()
        .skip(1)
        .filter(|a| {
            let flag = a == "--strict";
            strict |= flag;
            !flag
        })
        .collect();

    let client = YahooClient::from_config(&cfg);

    match args.as_slice() {
        [ticker] => {
            if let Err(e) = print_stock(&client, ticker).await {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        }
        [ticker, kind, expiration, strike] => {
            let request = match parse_request(ticker, kind, expiration, strike) {
                Ok(r) => r.strict(strict),
                Err(e) => {
                    eprintln!("{e}\n{USAGE}");
                    std::process::exit(2);
                }
            };
            if let Err(e) = print_option(&cfg, &client, &request).await {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn parse_request(ticker: &str, kind: &str, expiration: &str, strike: &str) -> Result<ChainRequest, String> {
    let kind: OptionKind = kind.parse()?;
    let expiration = NaiveDate::parse_from_str(expiration, DATE_FORMAT)
        .map_err(|e| format!("bad expiration {expiration:?}: {e}"))?;
    let strike: f64 = strike
        .parse()
        .map_err(|e| format!("bad strike {strike:?}: {e}"))?;
    Ok(ChainRequest::new(ticker, kind, expiration).with_strike(strike))
}

async fn print_stock(client: &YahooClient, ticker: &str) -> quotegreeks::QuoteResult<()> {
    let stock = Stock::fetch(client, ticker, None).await?;
    println!("{stock}");
    println!("  name:       {}", stock.name);
    println!("  exchange:   {} ({})", stock.exchange, stock.currency);
    println!("  change:     {:+.2} ({:+.2}%)", stock.change, stock.change_percent);
    if let Some(ts) = stock.last_trade_display() {
        println!("  last trade: {ts}");
    }
    Ok(())
}

async fn print_option(
    cfg: &AppConfig,
    client: &YahooClient,
    request: &ChainRequest,
) -> quotegreeks::QuoteResult<()> {
    let curve = risk_free_curve(cfg).await;
    let quote = fetch_option(client, curve.as_ref(), request).await?;

    println!("{quote}");
    println!("  underlying: {}", quote.underlying);
    println!("  last:       {:.2} (bid {:.2} / ask {:.2})", quote.price, quote.bid, quote.ask);
    println!("  volume:     {} (open interest {})", quote.volume, quote.open_interest);
    println!("  T:          {:.4}y  r={:.4}  q={:.4}", quote.ttl_years, quote.rate, quote.dividend_yield);

    match quote.greeks() {
        Ok(g) => {
            // valuation succeeded, so the vol is there too
            let iv = quote.implied_volatility()?;
            println!("  implied vol: {:.4}", iv);
            println!(
                "  delta {:.4}  gamma {:.4}  vega {:.4}  theta {:.4}  rho {:.4}",
                g.delta, g.gamma, g.vega, g.theta, g.rho
            );
        }
        Err(e) => tracing::warn!(error = %e, "no valuation for this contract"),
    }
    Ok(())
}
