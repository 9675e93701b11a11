use serde_json::{json, Value};

use crate::config::service::PriceFilters;

const SELECTION: &str = "agregators { sales_region_agregator { sales_organization_agregator { price_sales_agregator { edges { node { distribution_channel_code } } } } } }";

/// GraphQL `get_price` request body for the given SKUs and buyer.
pub fn price_query(skus: &[String], buyer_code: &str, filters: &PriceFilters) -> Value {
    let query = format!(
        "query MyQuery {{ get_price(filters: {{sku_code: {skus}, rounded: {rounded}, payment_code: {payment_code}, condition: {condition}, distribution_channel_code: {channel}, buyer_code: {buyer}, fifo_range: {fifo}}}) {{ {selection} }} }}",
        skus = json_list(skus),
        rounded = filters.rounded,
        payment_code = quoted(&filters.payment_code),
        condition = quoted(&filters.condition),
        channel = quoted(&filters.distribution_channel_code),
        buyer = quoted(buyer_code),
        fifo = json_list(&filters.fifo_range),
        selection = SELECTION,
    );
    json!({ "query": query })
}

// GraphQL string and list literals share JSON's syntax
fn quoted(value: &str) -> String {
    Value::String(value.to_owned()).to_string()
}

fn json_list(values: &[String]) -> String {
    Value::from(values.to_vec()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_skus_filters_and_buyer() {
        let skus = vec!["000000000000031933".to_owned(), "000000000000031934".to_owned()];
        let body = price_query(&skus, "0007554445", &PriceFilters::default());
        let query = body["query"].as_str().unwrap();

        assert!(query.starts_with("query MyQuery { get_price(filters: {"));
        assert!(query.contains(r#"sku_code: ["000000000000031933","000000000000031934"]"#));
        assert!(query.contains("rounded: 2"));
        assert!(query.contains(r#"payment_code: "R019""#));
        assert!(query.contains(r#"condition: "YB2B""#));
        assert!(query.contains(r#"distribution_channel_code: "10""#));
        assert!(query.contains(r#"buyer_code: "0007554445""#));
        assert!(query.contains(r#"fifo_range: ["Z100","Z098","Z101","Z102"]"#));
        assert!(query.contains("agregators { sales_region_agregator"));
    }

    #[test]
    fn escapes_quotes_in_values() {
        let body = price_query(&["a\"b".to_owned()], "x\"y", &PriceFilters::default());
        let query = body["query"].as_str().unwrap();
        assert!(query.contains(r#"sku_code: ["a\"b"]"#));
        assert!(query.contains(r#"buyer_code: "x\"y""#));
    }
}
