use crate::config::AppConfig;
use crate::errors::{QuoteError, QuoteResult};
use crate::models::yield_curve::TENORS;
use crate::models::{FlatRate, RateCurve, YieldCurve};
use reqwest::Client;

/// Par-yield elements in the daily treasury XML, in `TENORS[1..]` order.
const TENOR_TAGS: [&str; 12] = [
    "BC_1MONTH",
    "BC_2MONTH",
    "BC_3MONTH",
    "BC_6MONTH",
    "BC_1YEAR",
    "BC_2YEAR",
    "BC_3YEAR",
    "BC_5YEAR",
    "BC_7YEAR",
    "BC_10YEAR",
    "BC_20YEAR",
    "BC_30YEAR",
];

/// Risk-free curve for the session. Any failure (network, HTTP status,
/// malformed XML) degrades to a flat fallback rate; the caller always gets
/// a usable curve.
pub async fn risk_free_curve(config: &AppConfig) -> Box<dyn RateCurve> {
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .unwrap_or_default();

    match fetch_yield_curve(&client, &config.treasury_url, config.overnight_rate).await {
        Ok(curve) => {
            tracing::info!(knots = curve.points().len(), "treasury yield curve loaded");
            Box::new(curve)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                fallback = config.fallback_risk_free_rate,
                "treasury curve unavailable, using flat fallback rate"
            );
            Box::new(FlatRate(config.fallback_risk_free_rate))
        }
    }
}

pub async fn fetch_yield_curve(
    client: &Client,
    url: &str,
    overnight_rate: f64,
) -> QuoteResult<YieldCurve> {
    let resp = client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(QuoteError::Network(format!("treasury HTTP {status}")));
    }

    let text = resp.text().await?;
    parse_yield_xml(&text, overnight_rate)
}

/// Build the curve from the most recent `G_BC_CAT` entry. Yields are
/// published in percent. Tenors left empty on a given day are skipped.
pub fn parse_yield_xml(xml: &str, overnight_rate: f64) -> QuoteResult<YieldCurve> {
    let doc = roxmltree::Document::parse(xml)?;

    let latest = doc
        .descendants()
        .filter(|n| n.has_tag_name("G_BC_CAT"))
        .last()
        .ok_or_else(|| QuoteError::Parse("no G_BC_CAT entries in treasury feed".into()))?;

    let published: Vec<(f64, f64)> = TENORS[1..]
        .iter()
        .zip(TENOR_TAGS)
        .filter_map(|(&tenor, tag)| {
            let node = latest.children().find(|c| c.has_tag_name(tag))?;
            let pct = node.text()?.trim().parse::<f64>().ok()?;
            Some((tenor, pct / 100.0))
        })
        .collect();

    if published.is_empty() {
        return Err(QuoteError::Parse("treasury entry has no published yields".into()));
    }

    let points = std::iter::once((TENORS[0], overnight_rate)).chain(published);
    YieldCurve::new(points).ok_or_else(|| QuoteError::Parse("empty yield curve".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<QR_BC_CM>
  <LIST_G_WEEK_OF_MONTH>
    <G_WEEK_OF_MONTH>
      <LIST_G_NEW_DATE>
        <G_NEW_DATE>
          <BID_CURVE_DATE>13-OCT-26</BID_CURVE_DATE>
          <LIST_G_BC_CAT>
            <G_BC_CAT>
              <BC_1MONTH>9.99</BC_1MONTH>
              <BC_30YEAR>9.99</BC_30YEAR>
            </G_BC_CAT>
          </LIST_G_BC_CAT>
        </G_NEW_DATE>
        <G_NEW_DATE>
          <BID_CURVE_DATE>14-OCT-26</BID_CURVE_DATE>
          <LIST_G_BC_CAT>
            <G_BC_CAT>
              <BC_1MONTH>4.20</BC_1MONTH>
              <BC_2MONTH></BC_2MONTH>
              <BC_3MONTH>4.10</BC_3MONTH>
              <BC_6MONTH>4.00</BC_6MONTH>
              <BC_1YEAR>3.80</BC_1YEAR>
              <BC_2YEAR>3.60</BC_2YEAR>
              <BC_3YEAR>3.55</BC_3YEAR>
              <BC_5YEAR>3.60</BC_5YEAR>
              <BC_7YEAR>3.75</BC_7YEAR>
              <BC_10YEAR>3.95</BC_10YEAR>
              <BC_20YEAR>4.40</BC_20YEAR>
              <BC_30YEAR>4.45</BC_30YEAR>
            </G_BC_CAT>
          </LIST_G_BC_CAT>
        </G_NEW_DATE>
      </LIST_G_NEW_DATE>
    </G_WEEK_OF_MONTH>
  </LIST_G_WEEK_OF_MONTH>
</QR_BC_CM>"#;

    #[test]
    fn test_uses_latest_entry() {
        let curve = parse_yield_xml(FEED, 0.0).unwrap();
        assert_abs_diff_eq!(curve.rate(30.0), 0.0445, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.rate(1.0), 0.038, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_tenor_skipped() {
        let curve = parse_yield_xml(FEED, 0.0).unwrap();
        // 1 overnight knot + 11 published (2M is blank)
        assert_eq!(curve.points().len(), 12);
        // 2M interpolates between 1M and 3M
        assert_abs_diff_eq!(curve.rate(2.0 / 12.0), 0.0415, epsilon = 1e-12);
    }

    #[test]
    fn test_overnight_anchor() {
        let curve = parse_yield_xml(FEED, 0.043).unwrap();
        assert_eq!(curve.points()[0], (0.0, 0.043));
    }

    #[test]
    fn test_malformed_feed() {
        assert!(matches!(parse_yield_xml("<not-closed>", 0.0), Err(QuoteError::Parse(_))));
        assert!(matches!(parse_yield_xml("<QR_BC_CM/>", 0.0), Err(QuoteError::Parse(_))));
        let blank = "<r><G_BC_CAT><BC_1YEAR>N/A</BC_1YEAR></G_BC_CAT></r>";
        assert!(parse_yield_xml(blank, 0.0).is_err());
    }

    fn config_for(url: String) -> AppConfig {
        AppConfig::from_lookup(move |key| match key {
            "TREASURY_URL" => Some(url.clone()),
            "FALLBACK_RISK_FREE_RATE" => Some("0.031".into()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_curve_from_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/yield.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;

        let curve = risk_free_curve(&config_for(format!("{}/yield.xml", server.uri()))).await;
        assert_abs_diff_eq!(curve.rate(10.0), 0.0395, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_falls_back_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/yield.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let curve = risk_free_curve(&config_for(format!("{}/yield.xml", server.uri()))).await;
        assert_eq!(curve.rate(0.5), 0.031);
        assert_eq!(curve.rate(25.0), 0.031);
    }
}
