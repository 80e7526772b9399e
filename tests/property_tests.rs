use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use storefront_rs::models::{
    parse_attribute_filters, parse_category_ids, validate_cart_quantity, AttributeFilter, Cart,
    CartItem, CodSetting, Hierarchy, PricingRules, ProductListingParams, MAX_CART_QUANTITY,
    MAX_PAGE_SIZE, MIN_CART_QUANTITY,
};

prop_compose! {
    fn arb_price()(cents in 1u32..1_000_000) -> Decimal {
        Decimal::from_parts(cents, 0, 0, false, 2)
    }
}

prop_compose! {
    fn arb_percent()(basis_points in 0u32..10_000) -> Decimal {
        Decimal::from_parts(basis_points, 0, 0, false, 2)
    }
}

prop_compose! {
    fn arb_cart_item()(
        id in 1i64..10_000,
        product_id in 1i64..10_000,
        unit_price in arb_price(),
        quantity in MIN_CART_QUANTITY..=MAX_CART_QUANTITY,
        is_available in any::<bool>(),
    ) -> CartItem {
        CartItem {
            id,
            product_id,
            product_name: format!("Product {}", product_id),
            product_image: None,
            unit_price,
            quantity,
            is_available,
            created_on: Utc::now(),
        }
    }
}

// Ids 1..=n, each with an arbitrary parent (possibly itself or a loop)
prop_compose! {
    fn arb_hierarchy()(size in 1usize..25)(
        parents in prop::collection::vec(prop::option::of(1i64..=size as i64), size),
    ) -> Hierarchy {
        Hierarchy::from_links(
            parents
                .into_iter()
                .enumerate()
                .map(|(index, parent)| (index as i64 + 1, parent)),
        )
    }
}

prop_compose! {
    fn arb_attribute_filter()(
        name in "[A-Z][a-z]{0,7}",
        values in prop::collection::btree_set("[a-z0-9]{1,6}", 1..4),
    ) -> AttributeFilter {
        AttributeFilter {
            name,
            values: values.into_iter().collect(),
        }
    }
}

proptest! {
    #[test]
    fn test_descendants_are_unique_and_start_at_root(hierarchy in arb_hierarchy(), root in 1i64..25) {
        let ids = hierarchy.self_and_descendants(root);

        prop_assert_eq!(ids.first().copied(), Some(root));

        let mut distinct = ids.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(distinct.len(), ids.len());

        for id in ids.iter().skip(1) {
            let parent = hierarchy.parent_of(*id);
            prop_assert!(parent.map_or(false, |parent| ids.contains(&parent)));
        }
    }

    #[test]
    fn test_cycle_detection_matches_descendant_scope(
        hierarchy in arb_hierarchy(),
        node in 1i64..25,
        proposed_parent in 1i64..25,
    ) {
        let would_loop = hierarchy.creates_cycle(node, proposed_parent);
        let inside_subtree = hierarchy.self_and_descendants(node).contains(&proposed_parent);

        prop_assert_eq!(would_loop, inside_subtree);
    }

    #[test]
    fn test_cart_totals_sum_lines(items in prop::collection::vec(arb_cart_item(), 0..20)) {
        let cart = Cart { customer_id: 1, items: items.clone() };

        let expected_total: Decimal = items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();
        let expected_count: i32 = items.iter().map(|item| item.quantity).sum();

        prop_assert_eq!(cart.total_price(), expected_total);
        prop_assert_eq!(cart.total_items(), expected_count);
        prop_assert_eq!(cart.all_available(), items.iter().all(|item| item.is_available));
    }

    #[test]
    fn test_cart_quantity_validation(quantity in any::<i32>()) {
        let result = validate_cart_quantity(quantity);
        let in_range = (MIN_CART_QUANTITY..=MAX_CART_QUANTITY).contains(&quantity);

        prop_assert_eq!(result.is_ok(), in_range);
    }

    #[test]
    fn test_cod_eligibility_follows_bounds(
        total in arb_price(),
        min in prop::option::of(arb_price()),
        max in prop::option::of(arb_price()),
        payment_fee in arb_percent(),
    ) {
        let setting = CodSetting {
            min_order_value: min,
            max_order_value: max,
            payment_fee,
        };

        let expected = min.map_or(true, |min| total >= min) && max.map_or(true, |max| total <= max);
        prop_assert_eq!(setting.is_eligible(total), expected);

        let fee = setting.fee_for(total);
        prop_assert!(fee >= Decimal::ZERO);
        prop_assert!(fee <= total);
        prop_assert_eq!(fee, total * payment_fee / Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_pricing_totals_add_up(
        sub_total in arb_price(),
        tax_percent in arb_percent(),
        flat_shipping_fee in arb_price(),
        free_shipping_threshold in prop::option::of(arb_price()),
    ) {
        let rules = PricingRules {
            tax_percent,
            flat_shipping_fee,
            free_shipping_threshold,
        };
        let totals = rules.totals(sub_total);

        prop_assert_eq!(totals.discount, Decimal::ZERO);
        prop_assert!(totals.tax_amount.scale() <= 2);
        prop_assert_eq!(
            totals.order_total,
            totals.sub_total - totals.discount + totals.shipping_amount + totals.tax_amount
        );

        let ships_free = free_shipping_threshold.map_or(false, |threshold| sub_total >= threshold);
        let expected_shipping = if ships_free { Decimal::ZERO } else { flat_shipping_fee };
        prop_assert_eq!(totals.shipping_amount, expected_shipping);
    }

    #[test]
    fn test_category_ids_parse_back(ids in prop::collection::vec(1i64..1_000_000, 0..10)) {
        let raw = ids
            .iter()
            .map(|id| format!(" {} ", id))
            .collect::<Vec<_>>()
            .join(",");

        prop_assert_eq!(parse_category_ids(&raw).unwrap(), ids);
    }

    #[test]
    fn test_category_ids_reject_words(word in "[a-z]{1,8}") {
        let raw = format!("10,{}", word);
        prop_assert!(parse_category_ids(&raw).is_err());
    }

    #[test]
    fn test_attribute_filters_parse_groups(filters in prop::collection::vec(arb_attribute_filter(), 0..5)) {
        let raw = filters
            .iter()
            .map(|filter| format!("{}:{}", filter.name, filter.values.join(",")))
            .collect::<Vec<_>>()
            .join("|");

        prop_assert_eq!(parse_attribute_filters(&raw).unwrap(), filters);
    }

    #[test]
    fn test_listing_page_size_bounds(page in prop::option::of(0u32..50), page_size in 0u32..300) {
        let params = ProductListingParams {
            page,
            page_size: Some(page_size),
            ..Default::default()
        };

        match params.into_query(vec![1]) {
            Ok(query) => {
                prop_assert!(page_size >= 1 && page_size <= MAX_PAGE_SIZE);
                prop_assert!(query.page >= 1);
                prop_assert_eq!(
                    query.offset(),
                    i64::from(query.page - 1) * i64::from(page_size)
                );
            }
            Err(_) => prop_assert!(page_size == 0 || page_size > MAX_PAGE_SIZE),
        }
    }
}
