//! Denormalized views over the normalized tables.
//!
//! All joins are hash joins on the foreign key. Rows whose key has no match
//! on the other side are dropped without error.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::customer::{Customer, CustomerId};
use crate::domain::order::{Order, OrderId, OrderItem};
use crate::domain::product::{CategoryTranslation, Product, ProductId};
use crate::domain::sale::{LineItemView, SaleRecord};
use crate::filter::{DateRange, FilterConfig, StatusFilter};

/// Order x item x customer, restricted to `status`, and optionally to a
/// purchase window and a single customer state.
pub fn join_sales(
    orders: &[Order],
    items: &[OrderItem],
    customers: &[Customer],
    status: &StatusFilter,
    date_range: Option<&DateRange>,
    state: Option<&str>,
) -> Vec<SaleRecord> {
    let mut orders_by_id: HashMap<&OrderId, &Order> = HashMap::with_capacity(orders.len());
    for order in orders.iter().filter(|order| status.matches(&order.status)) {
        if date_range.is_some_and(|range| !range.contains(&order.purchased_at)) {
            continue;
        }
        orders_by_id.entry(&order.id).or_insert(order);
    }

    let mut customers_by_id: HashMap<&CustomerId, &Customer> =
        HashMap::with_capacity(customers.len());
    for customer in customers {
        customers_by_id.entry(&customer.id).or_insert(customer);
    }

    let sales = items
        .iter()
        .filter_map(|item| {
            let order = orders_by_id.get(&item.order_id)?;
            let customer = customers_by_id.get(&order.customer_id)?;
            if state.is_some_and(|state| state != customer.state) {
                return None;
            }
            Some(SaleRecord {
                order_id: order.id.clone(),
                customer_id: customer.id.clone(),
                state: customer.state.clone(),
                price: item.price,
                purchased_at: order.purchased_at,
            })
        })
        .collect::<Vec<_>>();

    debug!(
        event_name = "analysis.join.sales",
        eligible_orders = orders_by_id.len(),
        sale_records = sales.len(),
        "joined sales view"
    );
    sales
}

/// [`join_sales`] driven by a [`FilterConfig`].
pub fn join_sales_filtered(
    orders: &[Order],
    items: &[OrderItem],
    customers: &[Customer],
    filter: &FilterConfig,
) -> Vec<SaleRecord> {
    join_sales(
        orders,
        items,
        customers,
        &filter.status,
        filter.date_range.as_ref(),
        filter.state.as_deref(),
    )
}

/// Item x product (inner) x category translation (left).
pub fn join_line_items(
    items: &[OrderItem],
    products: &[Product],
    translations: &[CategoryTranslation],
) -> Vec<LineItemView> {
    let mut products_by_id: HashMap<&ProductId, &Product> = HashMap::with_capacity(products.len());
    for product in products {
        products_by_id.entry(&product.id).or_insert(product);
    }

    let mut english_by_name: HashMap<&str, &str> = HashMap::with_capacity(translations.len());
    for translation in translations {
        english_by_name
            .entry(translation.category_name.as_str())
            .or_insert(translation.category_name_english.as_str());
    }

    let views = items
        .iter()
        .filter_map(|item| {
            let product = products_by_id.get(&item.product_id)?;
            Some(LineItemView {
                order_id: item.order_id.clone(),
                category_name_english: english_by_name
                    .get(product.category_name.as_str())
                    .map(|name| (*name).to_string()),
            })
        })
        .collect::<Vec<_>>();

    debug!(
        event_name = "analysis.join.line_items",
        line_items = views.len(),
        unresolved = views.iter().filter(|view| view.category_name_english.is_none()).count(),
        "joined line item view"
    );
    views
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;

    use super::{join_line_items, join_sales};
    use crate::domain::customer::{Customer, CustomerId};
    use crate::domain::order::{Order, OrderId, OrderItem, OrderStatus};
    use crate::domain::product::{CategoryTranslation, Product, ProductId};
    use crate::filter::{DateRange, StatusFilter};

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(10, 30, 0))
            .expect("valid timestamp")
    }

    fn order(id: &str, customer: &str, status: OrderStatus, purchased_at: NaiveDateTime) -> Order {
        Order {
            id: OrderId(id.to_string()),
            customer_id: CustomerId(customer.to_string()),
            status,
            purchased_at,
        }
    }

    fn item(order_id: &str, product_id: &str, cents: i64) -> OrderItem {
        OrderItem {
            order_id: OrderId(order_id.to_string()),
            product_id: ProductId(product_id.to_string()),
            price: Decimal::new(cents, 2),
        }
    }

    fn customer(id: &str, state: &str) -> Customer {
        Customer { id: CustomerId(id.to_string()), state: state.to_string() }
    }

    fn order_ids(sales: &[crate::domain::sale::SaleRecord]) -> BTreeSet<String> {
        sales.iter().map(|sale| sale.order_id.0.clone()).collect()
    }

    #[test]
    fn only_delivered_orders_produce_sale_records() {
        let orders = vec![
            order("o1", "c1", OrderStatus::Delivered, at(2017, 5, 1)),
            order("o2", "c1", OrderStatus::Other("canceled".to_string()), at(2017, 5, 2)),
            order("o3", "c2", OrderStatus::Other("shipped".to_string()), at(2017, 5, 3)),
        ];
        let items = vec![item("o1", "p1", 1000), item("o2", "p1", 2000), item("o3", "p2", 3000)];
        let customers = vec![customer("c1", "SP"), customer("c2", "RJ")];

        let sales =
            join_sales(&orders, &items, &customers, &StatusFilter::default(), None, None);

        assert_eq!(order_ids(&sales), BTreeSet::from(["o1".to_string()]));
    }

    #[test]
    fn orphaned_keys_are_silently_excluded() {
        let orders = vec![
            order("o1", "c1", OrderStatus::Delivered, at(2017, 5, 1)),
            order("o2", "missing-customer", OrderStatus::Delivered, at(2017, 5, 1)),
        ];
        let items = vec![item("o1", "p1", 1000), item("o2", "p1", 1000), item("ghost", "p1", 1)];
        let customers = vec![customer("c1", "SP")];

        let sales =
            join_sales(&orders, &items, &customers, &StatusFilter::default(), None, None);

        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].state, "SP");
    }

    #[test]
    fn each_item_yields_one_sale_record() {
        let orders = vec![order("o1", "c1", OrderStatus::Delivered, at(2017, 5, 1))];
        let items = vec![item("o1", "p1", 1000), item("o1", "p2", 2550)];
        let customers = vec![customer("c1", "MG")];

        let sales =
            join_sales(&orders, &items, &customers, &StatusFilter::default(), None, None);

        assert_eq!(sales.len(), 2);
        let total: Decimal = sales.iter().map(|sale| sale.price).sum();
        assert_eq!(total, Decimal::new(3550, 2));
    }

    #[test]
    fn date_range_keeps_only_purchases_inside_the_window() {
        let orders = vec![
            order("dec", "c1", OrderStatus::Delivered, at(2016, 12, 31)),
            order("jan", "c1", OrderStatus::Delivered, at(2017, 1, 15)),
            order("feb", "c1", OrderStatus::Delivered, at(2017, 2, 1)),
        ];
        let items = vec![item("dec", "p1", 100), item("jan", "p1", 100), item("feb", "p1", 100)];
        let customers = vec![customer("c1", "SP")];
        let range = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2017, 1, 1).expect("date"),
            NaiveDate::from_ymd_opt(2017, 1, 31).expect("date"),
        )
        .expect("valid range");

        let sales = join_sales(
            &orders,
            &items,
            &customers,
            &StatusFilter::default(),
            Some(&range),
            None,
        );

        assert_eq!(order_ids(&sales), BTreeSet::from(["jan".to_string()]));
    }

    #[test]
    fn state_filter_matches_customer_state() {
        let orders = vec![
            order("o1", "c1", OrderStatus::Delivered, at(2017, 5, 1)),
            order("o2", "c2", OrderStatus::Delivered, at(2017, 5, 1)),
        ];
        let items = vec![item("o1", "p1", 100), item("o2", "p1", 100)];
        let customers = vec![customer("c1", "SP"), customer("c2", "RJ")];

        let sales = join_sales(
            &orders,
            &items,
            &customers,
            &StatusFilter::default(),
            None,
            Some("RJ"),
        );

        assert_eq!(order_ids(&sales), BTreeSet::from(["o2".to_string()]));
    }

    #[test]
    fn untranslated_categories_stay_as_unresolved_line_items() {
        let items = vec![item("o1", "p1", 100), item("o1", "p2", 100), item("o1", "gone", 100)];
        let products = vec![
            Product { id: ProductId("p1".to_string()), category_name: "beleza_saude".to_string() },
            Product { id: ProductId("p2".to_string()), category_name: "other".to_string() },
        ];
        let translations = vec![CategoryTranslation {
            category_name: "beleza_saude".to_string(),
            category_name_english: "health_beauty".to_string(),
        }];

        let views = join_line_items(&items, &products, &translations);

        assert_eq!(views.len(), 2, "unknown product is dropped by the inner join");
        assert_eq!(views[0].category_name_english.as_deref(), Some("health_beauty"));
        assert_eq!(views[1].category_name_english, None);
    }
}
