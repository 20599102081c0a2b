//! Reads the five source tables from delimited text files.

use std::path::{Path, PathBuf};

use salesight_core::config::DataConfig;
use salesight_core::RawTables;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not open `{path}`: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("could not read a row of `{path}`: {source}")]
    Row { path: PathBuf, source: csv::Error },
}

pub fn load_tables(data: &DataConfig) -> Result<RawTables, LoadError> {
    let delimiter = data.delimiter as u8;
    let tables = RawTables {
        orders: read_table(&data.orders_path(), delimiter)?,
        items: read_table(&data.order_items_path(), delimiter)?,
        customers: read_table(&data.customers_path(), delimiter)?,
        products: read_table(&data.products_path(), delimiter)?,
        translations: read_table(&data.translations_path(), delimiter)?,
    };

    info!(
        event_name = "cli.loader.completed",
        data_dir = %data.dir.display(),
        orders = tables.orders.len(),
        items = tables.items.len(),
        customers = tables.customers.len(),
        products = tables.products.len(),
        translations = tables.translations.len(),
        "loaded source tables"
    );
    Ok(tables)
}

/// Columns absent from `T` are ignored.
fn read_table<T: DeserializeOwned>(path: &Path, delimiter: u8) -> Result<Vec<T>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|source| LoadError::Open { path: path.to_path_buf(), source })?;

    reader
        .deserialize()
        .map(|row| row.map_err(|source| LoadError::Row { path: path.to_path_buf(), source }))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use salesight_core::config::AppConfig;
    use tempfile::TempDir;

    use super::{load_tables, LoadError};

    fn write_fixture(dir: &TempDir, delimiter: char) {
        let separator = delimiter.to_string();
        let join = |cells: &[&str]| cells.join(separator.as_str());
        let files = [
            (
                "orders_dataset.csv",
                vec![
                    join(&[
                        "order_id",
                        "customer_id",
                        "order_status",
                        "order_purchase_timestamp",
                        "order_approved_at",
                    ]),
                    join(&["o1", "c1", "delivered", "2017-10-02 10:56:33", "2017-10-02 11:07:15"]),
                ],
            ),
            (
                "order_items_dataset.csv",
                vec![
                    join(&["order_id", "order_item_id", "product_id", "seller_id", "price"]),
                    join(&["o1", "1", "p1", "s1", "29.99"]),
                ],
            ),
            (
                "customers_dataset.csv",
                vec![join(&["customer_id", "customer_state"]), join(&["c1", "SP"])],
            ),
            (
                "products_dataset.csv",
                vec![
                    join(&["product_id", "product_category_name", "product_weight_g"]),
                    join(&["p1", "", "500"]),
                ],
            ),
            (
                "product_category_name_translation.csv",
                vec![
                    join(&["product_category_name", "product_category_name_english"]),
                    join(&["perfumaria", "perfumery"]),
                ],
            ),
        ];
        for (name, lines) in files {
            fs::write(dir.path().join(name), lines.join("\n")).expect("fixture should be written");
        }
    }

    #[test]
    fn loads_tables_and_ignores_unused_columns() {
        let dir = TempDir::new().expect("temp dir");
        write_fixture(&dir, ',');
        let mut config = AppConfig::default();
        config.data.dir = dir.path().to_path_buf();

        let tables = load_tables(&config.data).expect("fixture should load");

        assert_eq!(tables.orders.len(), 1);
        assert_eq!(tables.orders[0].order_purchase_timestamp, "2017-10-02 10:56:33");
        assert_eq!(tables.items[0].price, "29.99");
        assert_eq!(tables.customers[0].customer_state, "SP");
        assert_eq!(tables.products[0].product_category_name, None);
        assert_eq!(tables.translations[0].product_category_name_english, "perfumery");
    }

    #[test]
    fn honours_configured_delimiter() {
        let dir = TempDir::new().expect("temp dir");
        write_fixture(&dir, ';');
        let mut config = AppConfig::default();
        config.data.dir = dir.path().to_path_buf();
        config.data.delimiter = ';';

        let tables = load_tables(&config.data).expect("fixture should load");

        assert_eq!(tables.items[0].product_id, "p1");
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = TempDir::new().expect("temp dir");
        let mut config = AppConfig::default();
        config.data.dir = dir.path().join("nowhere");

        let error = load_tables(&config.data).expect_err("missing directory should fail");

        assert!(matches!(
            error,
            LoadError::Open { ref path, .. } if path.ends_with("orders_dataset.csv")
        ));
    }
}
