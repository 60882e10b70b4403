use roadmap_board::db::{Database, OrderBy};
use roadmap_board::models::*;
use roadmap_board::store::Table;
use speculate2::speculate;
use uuid::Uuid;

fn fixture() -> BoardData {
    serde_json::from_str(include_str!("fixtures/board.json")).expect("Failed to parse fixture")
}

fn id(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid fixture id")
}

const CARD_VAULT: &str = "1a000000-0000-4000-8000-000000000001";
const CHECKOUT_REDESIGN: &str = "1a000000-0000-4000-8000-000000000002";
const REFUND_FLOW: &str = "1a000000-0000-4000-8000-000000000005";
const SPRINT_S2: &str = "50000000-0000-4000-8000-000000000002";

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        db.import(&fixture()).expect("Failed to import fixture");
    }

    describe "reference tables" {
        it "lists teams ordered by name" {
            let teams = db.list_teams(OrderBy::default_for(Table::Teams)).expect("Query failed");
            let names: Vec<&str> = teams.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["Checkout", "Core"]);
        }

        it "reads null descriptions and colors as empty strings" {
            let super_domains = db
                .list_super_domains(OrderBy::default_for(Table::SuperDomains))
                .expect("Query failed");
            assert_eq!(super_domains[1].name, "Platform");
            assert_eq!(super_domains[1].description, "");

            let domains = db.list_domains(OrderBy::default_for(Table::Domains)).expect("Query failed");
            let infra = domains.iter().find(|d| d.name == "Infrastructure").unwrap();
            assert_eq!(infra.color, "");
            assert_eq!(infra.super_domain_id, super_domains[1].id);
        }

        it "lists sprints by start date" {
            let sprints = db.list_sprints(OrderBy::default_for(Table::Sprints)).expect("Query failed");
            let names: Vec<&str> = sprints.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["S23 FY25", "S24 FY25", "S1", "S2 FY26", "Hack week", "S8"]);
        }

        it "honors a descending order" {
            let order = OrderBy::parse(Table::Sprints, "end_date.desc").unwrap();
            let sprints = db.list_sprints(order).expect("Query failed");
            assert_eq!(sprints[0].name, "S8");
        }
    }

    describe "roadmap items" {
        it "lists items by creation time with defaults for null columns" {
            let items = db.list_items(OrderBy::default_for(Table::RoadmapItems)).expect("Query failed");
            assert_eq!(items.len(), 6);
            assert_eq!(items[0].title, "Card vault");

            let refund = items.iter().find(|i| i.id == id(REFUND_FLOW)).unwrap();
            assert_eq!(refund.description, "");
            assert_eq!(refund.effort, Effort::Medium);
            assert!(refund.domain_id.is_none());
            assert!(refund.is_in_backlog());
        }

        it "reads the legacy hyphenated status" {
            let item = db.get_item(id(CHECKOUT_REDESIGN)).expect("Query failed").unwrap();
            assert_eq!(item.status, ItemStatus::InProgress);
        }

        it "round-trips dates" {
            let item = db.get_item(id(CARD_VAULT)).expect("Query failed").unwrap();
            assert_eq!(item.due_date, chrono::NaiveDate::from_ymd_opt(2025, 9, 20));
            assert_eq!(item.created_at.to_rfc3339(), "2025-07-01T09:00:00+00:00");
        }

        it "returns None for a missing item" {
            assert!(db.get_item(Uuid::new_v4()).expect("Query failed").is_none());
        }

        describe "create_item" {
            it "stores a new backlog item with defaults" {
                let created = db.create_item(&NewRoadmapItem::new("Fraud rules")).expect("Failed to create");

                let found = db.get_item(created.id).expect("Query failed").unwrap();
                assert_eq!(found.title, "Fraud rules");
                assert_eq!(found.status, ItemStatus::Planned);
                assert_eq!(found.priority, Priority::Medium);
                assert!(found.sprint_id.is_none());
            }

            it "rejects an unknown sprint" {
                let mut input = NewRoadmapItem::new("Nowhere");
                input.sprint_id = Some(Uuid::new_v4());
                assert!(db.create_item(&input).is_err());
            }
        }

        describe "update_item" {
            it "changes only the edited field" {
                let before = db.get_item(id(CARD_VAULT)).unwrap().unwrap();

                let updated = db
                    .update_item(id(CARD_VAULT), &ItemEdit::Title("Card vault v2".into()))
                    .expect("Update failed")
                    .unwrap();

                assert_eq!(updated.title, "Card vault v2");
                assert_eq!(updated.priority, before.priority);
                assert_eq!(updated.sprint_id, before.sprint_id);
                assert!(updated.updated_at > before.updated_at);
                assert_eq!(db.get_item(id(CARD_VAULT)).unwrap().unwrap(), updated);
            }

            it "moves an item between sprint and backlog" {
                db.update_item(id(CARD_VAULT), &ItemEdit::SprintId(Some(id(SPRINT_S2)))).unwrap();
                assert_eq!(db.get_item(id(CARD_VAULT)).unwrap().unwrap().sprint_id, Some(id(SPRINT_S2)));

                db.update_item(id(CARD_VAULT), &ItemEdit::SprintId(None)).unwrap();
                assert!(db.get_item(id(CARD_VAULT)).unwrap().unwrap().is_in_backlog());
            }

            it "clears a due date" {
                db.update_item(id(CARD_VAULT), &ItemEdit::DueDate(None)).unwrap();
                assert!(db.get_item(id(CARD_VAULT)).unwrap().unwrap().due_date.is_none());
            }

            it "returns None for a missing item" {
                let result = db.update_item(Uuid::new_v4(), &ItemEdit::Priority(Priority::Low)).unwrap();
                assert!(result.is_none());
            }

            it "keeps concurrent edits of different fields" {
                let item_id = id(CARD_VAULT);

                let titles = {
                    let db = db.clone();
                    std::thread::spawn(move || {
                        for n in 0..500 {
                            let title = format!("Card vault {}", n);
                            db.update_item(item_id, &ItemEdit::Title(title.clone())).unwrap();
                            assert_eq!(db.get_item(item_id).unwrap().unwrap().title, title);
                        }
                    })
                };
                let descriptions = {
                    let db = db.clone();
                    std::thread::spawn(move || {
                        for n in 0..500 {
                            let description = format!("Revision {}", n);
                            db.update_item(item_id, &ItemEdit::Description(description.clone())).unwrap();
                            assert_eq!(db.get_item(item_id).unwrap().unwrap().description, description);
                        }
                    })
                };
                titles.join().expect("title writer panicked");
                descriptions.join().expect("description writer panicked");

                let item = db.get_item(item_id).unwrap().unwrap();
                assert_eq!(item.title, "Card vault 499");
                assert_eq!(item.description, "Revision 499");
            }
        }

        describe "delete_item" {
            it "removes the row once" {
                assert!(db.delete_item(id(REFUND_FLOW)).unwrap());
                assert!(!db.delete_item(id(REFUND_FLOW)).unwrap());
                assert!(db.get_item(id(REFUND_FLOW)).unwrap().is_none());
            }
        }
    }

    describe "import" {
        it "replaces rows on re-import" {
            let mut data = fixture();
            data.teams[0].name = "Checkout & Payments".to_string();
            db.import(&data).expect("Re-import failed");

            let teams = db.list_teams(OrderBy::default_for(Table::Teams)).unwrap();
            assert_eq!(teams.len(), 2);
            assert_eq!(teams[0].name, "Checkout & Payments");

            let items = db.list_items(OrderBy::default_for(Table::RoadmapItems)).unwrap();
            assert_eq!(items.len(), 6);
        }
    }
}
