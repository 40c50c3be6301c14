#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use phorm_core::{
        AsValue, Contract, DiagnosticEvent, EntityDecoder, GenSpec, MemberInfo, PhormError,
        RecordedDiagnostics, Result, RowLabeled, Settings, TypeDescription, Value,
        unknown_member,
    };
    use std::{env, sync::Arc};

    fn init_logs() {
        let mut logger = env_logger::builder();
        logger
            .is_test(true)
            .format_file(true)
            .format_line_number(true);
        if env::var("RUST_LOG").is_err() {
            logger.filter_level(LevelFilter::Warn);
        }
        let _ = logger.try_init();
    }

    /// Implements `Contract` for a struct whose fields are all plain read write members.
    macro_rules! plain_contract {
        ($name:ident { $($field:ident: $ty:ty),* } $(, $extra:ident($($args:tt)*))*) => {
            impl Contract for $name {
                fn describe() -> TypeDescription {
                    TypeDescription::new(stringify!($name))
                        $(.member(MemberInfo::field::<$ty>(stringify!($field))))*
                        $(.$extra($($args)*))*
                }
                fn get_member(&self, ident: &str) -> Option<Value> {
                    match ident {
                        $(stringify!($field) => Some(self.$field.clone().as_value()),)*
                        _ => None,
                    }
                }
                fn set_member(&mut self, ident: &str, value: Value) -> Result<()> {
                    match ident {
                        $(stringify!($field) => self.$field = AsValue::try_from_value(value)?,)*
                        _ => return Err(unknown_member(stringify!($name), ident)),
                    }
                    Ok(())
                }
                fn create_default() -> Option<Self> {
                    Some(Default::default())
                }
            }
        };
    }

    #[derive(Debug, Default, PartialEq)]
    struct Vehicle {
        id: i32,
        kind: i32,
        name: String,
    }
    plain_contract!(Vehicle { id: i32, kind: i32, name: String });

    #[derive(Debug, Default, PartialEq)]
    struct Car {
        id: i32,
        kind: i32,
        name: String,
        doors: i32,
    }
    plain_contract!(Car { id: i32, kind: i32, name: String, doors: i32 }, spec_of("kind", 1));

    #[derive(Debug, Default, PartialEq)]
    struct Truck {
        id: i32,
        name: String,
        payload: f64,
    }
    plain_contract!(Truck { id: i32, name: String, payload: f64 }, spec_of("KIND", 2));

    #[derive(Debug, Default, PartialEq)]
    struct Shape {
        id: i32,
        kind: String,
    }
    plain_contract!(Shape { id: i32, kind: String }, abstract_type());

    #[derive(Debug, Default, PartialEq)]
    struct Circle {
        id: i32,
        radius: f64,
    }
    plain_contract!(Circle { id: i32, radius: f64 }, spec_of("kind", "circle"));

    fn vehicles() -> Vec<RowLabeled> {
        let labels: Arc<[String]> = ["id", "kind", "name", "doors", "payload"]
            .into_iter()
            .map(String::from)
            .collect();
        [
            (1, 1, "Panda", 5, 0.0),
            (2, 2, "Actros", 0, 18.5),
            (3, 0, "Ape", 0, 0.2),
            (4, 1, "Mini", 3, 0.0),
        ]
        .into_iter()
        .map(|(id, kind, name, doors, payload)| {
            RowLabeled::new(
                labels.clone(),
                [
                    Value::Int32(Some(id)),
                    Value::Int32(Some(kind)),
                    Value::Varchar(Some(name.into())),
                    Value::Int32(Some(doors)),
                    Value::Float64(Some(payload)),
                ]
                .into(),
            )
        })
        .collect()
    }

    #[test]
    fn resolve_concrete_general() {
        init_logs();
        let genspec = GenSpec::<Vehicle>::new()
            .unwrap()
            .with::<Car>()
            .unwrap()
            .with::<Truck>()
            .unwrap();
        assert_eq!(genspec.variants().len(), 2);
        assert_eq!(genspec.variants()[1].discriminator, 1);

        let rows = vehicles();
        let mut result = genspec.resolve(&EntityDecoder::default(), &rows).unwrap();
        assert_eq!(result.len(), 4);
        let cars = result.of::<Car>();
        assert_eq!(cars.len(), 2);
        assert_eq!(cars[0].name, "Panda");
        assert_eq!(cars[1].doors, 3);
        assert_eq!(
            result.take::<Truck>(),
            [Truck {
                id: 2,
                name: "Actros".into(),
                payload: 18.5,
            }]
        );
        assert!(result.take::<Truck>().is_empty());
        assert_eq!(
            result.general,
            [Vehicle {
                id: 3,
                kind: 0,
                name: "Ape".into(),
            }]
        );
    }

    #[test]
    fn resolve_abstract_general() {
        init_logs();
        let diagnostics = Arc::new(RecordedDiagnostics::new());
        let decoder = EntityDecoder::new(Settings::default().with_diagnostics(diagnostics.clone()));
        let genspec = GenSpec::<Shape>::new().unwrap().with::<Circle>().unwrap();
        let labels: Arc<[String]> = ["id", "kind", "radius"]
            .into_iter()
            .map(String::from)
            .collect();
        let rows = [
            RowLabeled::new(
                labels.clone(),
                [
                    Value::Int32(Some(1)),
                    Value::Varchar(Some("circle".into())),
                    Value::Float64(Some(2.0)),
                ]
                .into(),
            ),
            RowLabeled::new(
                labels.clone(),
                [
                    Value::Int32(Some(2)),
                    Value::Varchar(Some("hexagon".into())),
                    Value::Null,
                ]
                .into(),
            ),
        ];
        let result = genspec.resolve(&decoder, &rows).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.general.is_empty());
        assert_eq!(result.of::<Circle>(), [&Circle { id: 1, radius: 2.0 }]);
        assert!(diagnostics.events().iter().any(|v| matches!(
            v,
            DiagnosticEvent::DroppedRow { entity, .. } if entity == "Shape"
        )));
    }

    #[test]
    fn first_registered_wins() {
        init_logs();
        let genspec = GenSpec::<Vehicle>::new()
            .unwrap()
            .with::<Car>()
            .unwrap()
            .with_variant::<Truck>("kind", 1)
            .unwrap();
        let rows = vehicles();
        let result = genspec.resolve(&EntityDecoder::default(), &rows).unwrap();
        assert_eq!(result.of::<Car>().len(), 2);
        assert!(result.of::<Truck>().is_empty());
        assert_eq!(result.general.len(), 2);
    }

    #[test]
    fn invalid_variants() {
        init_logs();
        let error = GenSpec::<Vehicle>::new()
            .unwrap()
            .with_variant::<Truck>("category", 2)
            .err()
            .expect("Unknown discriminator member");
        assert!(matches!(
            PhormError::of(&error),
            Some(PhormError::ContractDefinition { member, .. }) if member == "category"
        ));

        let error = GenSpec::<Car>::new()
            .unwrap()
            .with::<Vehicle>()
            .err()
            .expect("Vehicle has no discriminator declaration");
        assert!(matches!(
            PhormError::of(&error),
            Some(PhormError::ContractDefinition { .. })
        ));

        let error = GenSpec::<Vehicle>::new()
            .unwrap()
            .with_variant::<Shape>("kind", 3)
            .err()
            .expect("Abstract types cannot be variants");
        assert!(matches!(
            PhormError::of(&error),
            Some(PhormError::MissingConstructor { .. })
        ));
    }
}
