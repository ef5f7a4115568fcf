//! Benchmark repository reads and writes with a 500-character dataset.

use chardb_common::{CharacterId, ClassId, EquipmentSlot};
use chardb_db::models::{Character, Class, Equipment, Item};
use chardb_db::pool::{init_memory_pool, PooledConnection};
use chardb_db::queries::{characters, repository};
use criterion::{criterion_group, criterion_main, Criterion};

fn equipped(name: String, class_id: ClassId) -> Character {
    let mut character = Character::new(name);
    character.class_id = Some(class_id);
    character.inventory = vec![
        Item::new("Torch", "gear"),
        Item::new("Rations", "food"),
    ];
    let mut equipment = Equipment::default();
    equipment.equip(EquipmentSlot::MainHand, Item::new("Mace", "weapon"));
    equipment.equip(EquipmentSlot::Body, Item::new("Leather", "armor"));
    character.equipment = Some(equipment);
    character
}

fn setup() -> (PooledConnection, ClassId, CharacterId) {
    let pool = init_memory_pool().expect("pool");
    let conn = pool.get().expect("conn");

    let class = repository::create(&conn, Class::new("Cleric")).unwrap();
    let class_id = class.id.unwrap();

    let batch: Vec<_> = (0..500)
        .map(|i| equipped(format!("Hero {i:04}"), class_id))
        .collect();
    let created = repository::create_bulk(&conn, batch).unwrap();

    (conn, class_id, created[0].id.unwrap())
}

fn bench_repository(c: &mut Criterion) {
    let (conn, class_id, character_id) = setup();

    let mut group = c.benchmark_group("repository");

    group.bench_function("fetch_character_with_children", |b| {
        b.iter(|| {
            characters::get_character(&conn, character_id).unwrap();
        });
    });

    group.bench_function("list_characters_by_class", |b| {
        b.iter(|| {
            characters::list_characters_by_class(&conn, class_id).unwrap();
        });
    });

    group.bench_function("count_characters", |b| {
        b.iter(|| {
            repository::count::<Character>(&conn).unwrap();
        });
    });

    group.bench_function("upsert_character", |b| {
        let mut character = characters::get_character(&conn, character_id).unwrap();
        b.iter(|| {
            character.experience += 1;
            character = repository::update(&conn, character.clone()).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_repository);
criterion_main!(benches);
