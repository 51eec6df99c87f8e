use common::{ItemId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Actor, CartLine, CartSnapshot, CatalogItem, CreateOrder, DecideOrder, InMemoryStore, Money,
    Order, OrderEvent, OrderService, ReservationLine, ShippingAddress, plan_reservation,
};

fn address() -> ShippingAddress {
    ShippingAddress {
        recipient: "Bench Recipient".to_string(),
        line1: "1 Main St".to_string(),
        line2: None,
        city: "Springfield".to_string(),
        postal_code: "00001".to_string(),
        country: "US".to_string(),
        phone: None,
    }
}

fn catalog(items: usize) -> Vec<CatalogItem> {
    (0..items)
        .map(|i| {
            CatalogItem::new(
                format!("SKU-{i:03}"),
                format!("Product {i}"),
                Money::from_cents(100 + i as i64),
                1_000_000,
            )
        })
        .collect()
}

fn bench_plan_reservation(c: &mut Criterion) {
    let snapshot = catalog(50);
    let lines: Vec<_> = snapshot
        .iter()
        .map(|item| ReservationLine {
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            quantity: 3,
        })
        .collect();

    c.bench_function("domain/plan_reservation_50_lines", |b| {
        b.iter(|| plan_reservation(&lines, &snapshot).unwrap());
    });
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = OrderService::new(InMemoryStore::with_items(catalog(10)));
    let customer = Actor::customer(UserId::new());
    let cart: CartSnapshot = (0..10)
        .map(|i| CartLine::new(format!("SKU-{i:03}"), 1))
        .collect();

    c.bench_function("domain/create_order_10_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .create_order(&customer, CreateOrder::new(cart.clone(), address()))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_create_and_approve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = OrderService::new(InMemoryStore::with_items(catalog(10)));
    let customer = Actor::customer(UserId::new());
    let admin = Actor::admin(UserId::new());
    let cart: CartSnapshot = (0..10)
        .map(|i| CartLine::new(format!("SKU-{i:03}"), 1))
        .collect();

    c.bench_function("domain/create_and_approve_10_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = service
                    .create_order(&customer, CreateOrder::new(cart.clone(), address()))
                    .await
                    .unwrap();
                service
                    .decide_order(&admin, DecideOrder::approve(order.id()))
                    .await
                    .unwrap();
            });
        });
    });

    rt.block_on(async {
        let remaining = service
            .store()
            .stock_of(&ItemId::new("SKU-000"))
            .await
            .unwrap();
        assert!(remaining < 1_000_000);
    });
}

fn bench_replay_audit_log(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = OrderService::new(InMemoryStore::with_items(catalog(1)));
    let customer = Actor::customer(UserId::new());
    let admin = Actor::admin(UserId::new());

    let order_id = rt.block_on(async {
        let order = service
            .create_order(
                &customer,
                CreateOrder::new(CartSnapshot::new(vec![CartLine::new("SKU-000", 1)]), address()),
            )
            .await
            .unwrap();
        for _ in 0..25 {
            service
                .decide_order(&admin, DecideOrder::approve(order.id()))
                .await
                .unwrap();
            service
                .decide_order(&admin, DecideOrder::reject(order.id()))
                .await
                .unwrap();
        }
        order.id()
    });

    c.bench_function("domain/replay_51_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let records = service.order_events(&admin, order_id).await.unwrap();
                let events = records
                    .into_iter()
                    .map(|r| serde_json::from_value::<OrderEvent>(r.payload).unwrap());
                Order::from_history(events).unwrap()
            });
        });
    });
}

criterion_group!(
    benches,
    bench_plan_reservation,
    bench_create_order,
    bench_create_and_approve,
    bench_replay_audit_log,
);
criterion_main!(benches);
