//! Scenario output
//!
//! Fetches balances and allowances for the scenario accounts and renders
//! them, the orders and the settlement receipt as plain-text tables logged
//! through `tracing`.

use contracts::exchange::{Exchange, TransactionReceipt};
use serde::{Deserialize, Serialize};
use tracing::info;
use types::asset::AssetData;
use types::ids::Address;
use types::numeric::Amount;
use types::order::Order;

/// One account/asset cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub account: String,
    pub symbol: String,
    pub amount: Amount,
}

/// Balances (or allowances) of every tracked account in every tracked asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub rows: Vec<BalanceRow>,
}

impl BalanceSnapshot {
    pub fn get(&self, account: &str, symbol: &str) -> Option<Amount> {
        self.rows
            .iter()
            .find(|r| r.account == account && r.symbol == symbol)
            .map(|r| r.amount)
    }
}

/// Named accounts and tokens to report on.
#[derive(Debug, Clone)]
pub struct PrintUtils {
    accounts: Vec<(String, Address)>,
    tokens: Vec<(String, AssetData)>,
    decimals: u32,
}

impl PrintUtils {
    pub fn new(accounts: Vec<(String, Address)>, tokens: Vec<(String, AssetData)>, decimals: u32) -> Self {
        Self {
            accounts,
            tokens,
            decimals,
        }
    }

    pub fn print_scenario(name: &str) {
        info!("==== {} ====", name);
    }

    pub fn print_accounts(&self) {
        let rows: Vec<(String, String)> = self
            .accounts
            .iter()
            .map(|(label, address)| (label.clone(), address.to_string()))
            .collect();
        Self::print_data("Accounts", &rows);
    }

    pub fn print_data(title: &str, rows: &[(String, String)]) {
        let rows: Vec<Vec<String>> = rows.iter().map(|(k, v)| vec![k.clone(), v.clone()]).collect();
        info!("\n{}", format_table(title, &[], &rows));
    }

    pub fn print_order(title: &str, order: &Order) {
        Self::print_data(title, &order_rows(order));
    }

    pub fn print_transaction(&self, name: &str, receipt: &TransactionReceipt, extra: &[(String, String)]) {
        let mut rows = vec![
            ("txId".to_string(), receipt.tx_id.clone()),
            ("sequence".to_string(), receipt.sequence.to_string()),
            ("events".to_string(), receipt.events.len().to_string()),
        ];
        rows.extend_from_slice(extra);
        Self::print_data(&format!("Transaction {}", name), &rows);
    }

    pub async fn fetch_balances(&self, exchange: &Exchange) -> BalanceSnapshot {
        let mut rows = Vec::new();
        for (label, address) in &self.accounts {
            for (symbol, asset) in &self.tokens {
                rows.push(BalanceRow {
                    account: label.clone(),
                    symbol: symbol.clone(),
                    amount: exchange.balance_of(address, asset).await,
                });
            }
        }
        BalanceSnapshot { rows }
    }

    pub async fn fetch_allowances(&self, exchange: &Exchange) -> BalanceSnapshot {
        let mut rows = Vec::new();
        for (label, address) in &self.accounts {
            for (symbol, asset) in &self.tokens {
                rows.push(BalanceRow {
                    account: label.clone(),
                    symbol: symbol.clone(),
                    amount: exchange.allowance_of(address, asset).await,
                });
            }
        }
        BalanceSnapshot { rows }
    }

    pub fn print_snapshot(&self, title: &str, snapshot: &BalanceSnapshot) {
        info!("\n{}", self.render_snapshot(title, snapshot));
    }

    /// Accounts as rows, tokens as columns.
    pub fn render_snapshot(&self, title: &str, snapshot: &BalanceSnapshot) -> String {
        let mut headers = vec!["Account".to_string()];
        headers.extend(self.tokens.iter().map(|(symbol, _)| symbol.clone()));

        let rows: Vec<Vec<String>> = self
            .accounts
            .iter()
            .map(|(label, _)| {
                let mut row = vec![label.clone()];
                row.extend(self.tokens.iter().map(|(symbol, _)| {
                    snapshot
                        .get(label, symbol)
                        .map(|amount| format_amount(amount, self.decimals))
                        .unwrap_or_default()
                }));
                row
            })
            .collect();
        format_table(title, &headers, &rows)
    }
}

/// Human-unit rendering; `Amount::MAX` is an unlimited allowance.
pub fn format_amount(amount: Amount, decimals: u32) -> String {
    if amount == Amount::MAX {
        return "unlimited".to_string();
    }
    match amount.to_units(decimals) {
        Some(units) => units.to_string(),
        None => format!("{} (base units)", amount),
    }
}

fn order_rows(order: &Order) -> Vec<(String, String)> {
    let restriction = |a: Option<Address>| a.map(|a| a.to_string()).unwrap_or_else(|| "any".to_string());
    vec![
        ("exchange".to_string(), order.exchange.to_string()),
        ("maker".to_string(), order.maker.to_string()),
        ("taker".to_string(), restriction(order.taker_restriction())),
        ("sender".to_string(), restriction(order.sender_restriction())),
        ("feeRecipient".to_string(), restriction(order.fee_recipient_address())),
        ("expiration".to_string(), order.expiration.to_string()),
        ("salt".to_string(), order.salt.to_string()),
        ("makerAssetAmount".to_string(), order.maker_asset_amount.to_string()),
        ("takerAssetAmount".to_string(), order.taker_asset_amount.to_string()),
        ("makerAsset".to_string(), order.maker_asset.to_string()),
        ("takerAsset".to_string(), order.taker_asset.to_string()),
        ("makerFee".to_string(), order.maker_fee.to_string()),
        ("takerFee".to_string(), order.taker_fee.to_string()),
    ]
}

/// Render `rows` under `title` with columns padded to their widest cell.
pub fn format_table(title: &str, headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render = |row: &[String]| -> String {
        row.iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![title.to_string()];
    if !headers.is_empty() {
        out.push(render(headers));
        let rule_len = widths.iter().sum::<usize>() + 3 * columns.saturating_sub(1);
        out.push("-".repeat(rule_len));
    }
    out.extend(rows.iter().map(|row| render(row)));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_amount() {
        let amount = Amount::from_str("9800000000000000000").unwrap();
        assert_eq!(format_amount(amount, 18), "9.8");
        assert_eq!(format_amount(Amount::ZERO, 18), "0");
        assert_eq!(format_amount(Amount::MAX, 18), "unlimited");
    }

    #[test]
    fn test_format_table_pads_columns() {
        let headers = vec!["Account".to_string(), "ZRX".to_string()];
        let rows = vec![
            vec!["leftMaker".to_string(), "10".to_string()],
            vec!["matcher".to_string(), "9.8".to_string()],
        ];
        let table = format_table("Balances", &headers, &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Balances");
        assert_eq!(lines[1], "Account   | ZRX");
        assert_eq!(lines[2], "---------------");
        assert_eq!(lines[3], "leftMaker | 10");
        assert_eq!(lines[4], "matcher   | 9.8");
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = BalanceSnapshot {
            rows: vec![BalanceRow {
                account: "matcher".to_string(),
                symbol: "ZRX".to_string(),
                amount: Amount::from_u64(5),
            }],
        };
        assert_eq!(snapshot.get("matcher", "ZRX"), Some(Amount::from_u64(5)));
        assert_eq!(snapshot.get("matcher", "WETH"), None);
    }
}
