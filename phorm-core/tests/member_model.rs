#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use phorm_core::{
        AsValue, Behavior, Contract, MemberAttribute, MemberInfo, MemberKind, MemberModel,
        ParameterDirection, PhormError, Result, SourceId, TypeDescription, Value, unknown_member,
    };
    use std::{any::TypeId, env, sync::Arc};

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

    #[derive(Debug, Default)]
    struct PlaceOrder {
        id: i64,
        customer: String,
        total: f64,
        confirmation: Option<String>,
        status: i32,
        scratch: Vec<String>,
    }

    impl PlaceOrder {
        fn label(&self) -> String {
            format!("{}#{}", self.customer, self.id)
        }
    }

    impl Contract for PlaceOrder {
        fn describe() -> TypeDescription {
            TypeDescription::new("PlaceOrder")
                .member(MemberInfo::field::<i64>("id"))
                .member(
                    MemberInfo::field::<String>("customer")
                        .with(MemberAttribute::Rename("customer_name"))
                        .with(MemberAttribute::Required)
                        .with(MemberAttribute::Size(40)),
                )
                .member(MemberInfo::field::<f64>("total").read_only())
                .member(MemberInfo::field::<Option<String>>("confirmation").write_only())
                .member(MemberInfo::field::<i32>("status").with(MemberAttribute::ReturnValue))
                .member(MemberInfo::opaque("scratch").with(MemberAttribute::Ignore))
                .member(MemberInfo::opaque("console").with(MemberAttribute::Console))
                .member(MemberInfo::calculated::<String>("label"))
        }
        fn get_member(&self, ident: &str) -> Option<Value> {
            Some(match ident {
                "id" => self.id.as_value(),
                "customer" => self.customer.clone().as_value(),
                "total" => self.total.as_value(),
                "status" => self.status.as_value(),
                "label" => self.label().as_value(),
                _ => return None,
            })
        }
        fn set_member(&mut self, ident: &str, value: Value) -> Result<()> {
            match ident {
                "id" => self.id = AsValue::try_from_value(value)?,
                "customer" => self.customer = AsValue::try_from_value(value)?,
                "confirmation" => self.confirmation = AsValue::try_from_value(value)?,
                "status" => self.status = AsValue::try_from_value(value)?,
                _ => return Err(unknown_member("PlaceOrder", ident)),
            }
            Ok(())
        }
        fn create_default() -> Option<Self> {
            Some(Default::default())
        }
    }

    fn direction_of(ident: &str) -> Option<ParameterDirection> {
        MemberModel::derive::<PlaceOrder>()
            .unwrap()
            .iter()
            .find(|v| v.ident == ident)
            .map(|v| v.direction)
    }

    fn definition_error(description: TypeDescription) -> PhormError {
        let error = MemberModel::from_description(TypeId::of::<()>(), &description)
            .expect_err("The description should be rejected");
        PhormError::of(&error)
            .cloned()
            .expect("The error should be a PhormError")
    }

    #[test]
    fn derive_is_cached() {
        init_logs();
        let first = MemberModel::derive::<PlaceOrder>().unwrap();
        let second = MemberModel::derive::<PlaceOrder>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn derive_members() {
        init_logs();
        let members = MemberModel::derive::<PlaceOrder>().unwrap();
        let idents: Vec<_> = members.iter().map(|v| v.ident).collect();
        assert_eq!(
            idents,
            ["id", "customer", "total", "confirmation", "status", "label"]
        );
        let customer = &members[1];
        assert_eq!(customer.db_name, "customer_name");
        assert!(customer.is_required);
        assert_eq!(customer.size, Some(40));
        assert_eq!(customer.ordinal, 1);
        assert!(customer.matches_name("CUSTOMER_NAME"));
        assert!(customer.matches_name("customer"));
        assert_eq!(
            customer.source_id,
            SourceId {
                owner: TypeId::of::<PlaceOrder>(),
                ident: "customer",
            }
        );
        assert!(members[3].nullable);
        assert!(!members[0].nullable);
        assert_eq!(members[5].value, Value::Varchar(None));
    }

    #[test]
    fn derive_directions() {
        init_logs();
        assert_eq!(direction_of("id"), Some(ParameterDirection::InputOutput));
        assert_eq!(direction_of("customer"), Some(ParameterDirection::InputOutput));
        assert_eq!(direction_of("total"), Some(ParameterDirection::Input));
        assert_eq!(direction_of("confirmation"), Some(ParameterDirection::Output));
        assert_eq!(direction_of("status"), Some(ParameterDirection::ReturnValue));
        assert_eq!(direction_of("label"), Some(ParameterDirection::Input));
        assert_eq!(direction_of("scratch"), None);
        assert_eq!(direction_of("console"), None);
    }

    #[test]
    fn forced_output() {
        init_logs();
        let members = MemberModel::from_description(
            TypeId::of::<()>(),
            &TypeDescription::new("Forced")
                .member(MemberInfo::field::<i32>("a").with(MemberAttribute::Output))
                .member(MemberInfo::field::<i32>("b").with_kind(MemberKind::Field {
                    readable: false,
                    writable: false,
                })),
        )
        .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].direction, ParameterDirection::Output);
    }

    #[test]
    fn duplicate_names() {
        init_logs();
        let error = definition_error(
            TypeDescription::new("Duplicated")
                .member(MemberInfo::field::<i32>("first").with(MemberAttribute::Rename("value")))
                .member(MemberInfo::field::<i32>("second").with(MemberAttribute::Rename("VALUE"))),
        );
        assert!(
            matches!(error, PhormError::ContractDefinition { ref member, .. } if member == "second")
        );
    }

    #[test]
    fn invalid_calculated() {
        init_logs();
        let error = definition_error(TypeDescription::new("Calc").member(
            MemberInfo::calculated::<i32>("compute").with_kind(MemberKind::Calculated {
                parameters: 1,
                writable: false,
            }),
        ));
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
        let error = definition_error(
            TypeDescription::new("Calc")
                .member(MemberInfo::calculated::<i32>("compute").with(MemberAttribute::Output)),
        );
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
        let error = definition_error(TypeDescription::new("Calc").member(
            MemberInfo::calculated::<i32>("compute").with_kind(MemberKind::Calculated {
                parameters: 0,
                writable: true,
            }),
        ));
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
    }

    #[test]
    fn output_and_return_value() {
        init_logs();
        let error = definition_error(
            TypeDescription::new("Both").member(
                MemberInfo::field::<i32>("result")
                    .with(MemberAttribute::Output)
                    .with(MemberAttribute::ReturnValue),
            ),
        );
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
    }

    #[test]
    fn enum_behaviors() {
        init_logs();
        let kind = || MemberInfo {
            value: Value::Enum(None),
            nullable: false,
            ..MemberInfo::opaque("kind")
        };
        let members = MemberModel::from_description(
            TypeId::of::<()>(),
            &TypeDescription::new("Enums")
                .member(kind())
                .member(MemberInfo {
                    ident: "named",
                    ..kind()
                        .with(MemberAttribute::Behavior(Behavior::EnumAsString))
                        .with(MemberAttribute::Behavior(Behavior::secure("pii")))
                }),
        )
        .unwrap();
        assert_eq!(members[0].behaviors, [Behavior::EnumAsInt]);
        assert_eq!(
            members[1].behaviors,
            [Behavior::secure("pii"), Behavior::EnumAsString]
        );
        assert!(members[1].is_deferred());
        assert!(members[1].enum_as_string());

        let error = definition_error(TypeDescription::new("Enums").member(
            kind()
                .with(MemberAttribute::Behavior(Behavior::EnumAsInt))
                .with(MemberAttribute::Behavior(Behavior::EnumAsString)),
        ));
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
        let error = definition_error(TypeDescription::new("Enums").member(
            MemberInfo::field::<i32>("number").with(MemberAttribute::Behavior(Behavior::EnumAsString)),
        ));
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
    }

    #[test]
    fn secure_authenticator() {
        init_logs();
        let members = MemberModel::from_description(
            TypeId::of::<()>(),
            &TypeDescription::new("Secure")
                .member(MemberInfo::field::<i64>("id"))
                .member(
                    MemberInfo::field::<String>("ssn")
                        .with(MemberAttribute::Behavior(Behavior::secure_with("pii", "id"))),
                ),
        )
        .unwrap();
        assert_eq!(members[1].secure().and_then(|v| v.authenticator), Some("id"));

        let error = definition_error(TypeDescription::new("Secure").member(
            MemberInfo::field::<String>("ssn")
                .with(MemberAttribute::Behavior(Behavior::secure_with("pii", "missing"))),
        ));
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
        let error = definition_error(TypeDescription::new("Secure").member(
            MemberInfo::field::<String>("ssn")
                .with(MemberAttribute::Behavior(Behavior::secure_with("pii", "ssn"))),
        ));
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
        let error = definition_error(
            TypeDescription::new("Secure").member(
                MemberInfo::field::<String>("ssn")
                    .with(MemberAttribute::Behavior(Behavior::secure("pii")))
                    .with(MemberAttribute::Behavior(Behavior::secure("pii"))),
            ),
        );
        assert!(matches!(error, PhormError::ContractDefinition { .. }));
    }

    #[test]
    fn set_unknown_member() {
        let mut order = PlaceOrder::default();
        assert!(order.set_member("total", Value::Float64(Some(1.0))).is_err());
        assert!(order.set_member("id", Value::Int32(Some(7))).is_ok());
        assert_eq!(order.id, 7);
        assert_eq!(
            order.get_member("label"),
            Some(Value::Varchar(Some("#7".into())))
        );
        assert!(order.scratch.is_empty());
    }
}
