#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use phorm_core::{
        Arguments, AsValue, Behavior, Cipher, Constructor, Contract, ContractMemberValue,
        Decryptor, DiagnosticEvent, Encryptor, EntityDecoder, EntityShape, EnumValue, Error,
        MemberAttribute, MemberDefinition, MemberInfo, MemberModel, Parameter,
        ParameterDirection, ParameterEncoder, PhormError, RecordedDiagnostics, Result,
        RowLabeled, SecureValueProvider, Settings, Transformed, TypeDescription, Value,
        ValueTransform, unknown_member,
    };
    use rust_decimal::Decimal;
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

    fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
        RowLabeled::new(
            labels.iter().map(|v| v.to_string()).collect(),
            values.into(),
        )
    }

    struct Xor {
        key: u8,
    }
    impl Encryptor for Xor {
        fn set_authenticator(&mut self, authenticator: &[u8]) {
            self.key = authenticator.iter().fold(0x33, |acc, v| acc ^ v);
        }
        fn encrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
            Ok(data.iter().map(|v| v ^ self.key).collect())
        }
    }
    impl Decryptor for Xor {
        fn set_authenticator(&mut self, authenticator: &[u8]) {
            self.key = authenticator.iter().fold(0x33, |acc, v| acc ^ v);
        }
        fn decrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
            Ok(data.iter().map(|v| v ^ self.key).collect())
        }
    }

    #[derive(Debug)]
    struct XorProvider;
    impl SecureValueProvider for XorProvider {
        fn encryptor(&self, _classification: &str) -> Option<Cipher<Box<dyn Encryptor>>> {
            Some(Cipher::Handler(Box::new(Xor { key: 0 })))
        }
        fn decryptor(
            &self,
            _classification: &str,
            _data: &[u8],
        ) -> Option<Cipher<Box<dyn Decryptor>>> {
            Some(Cipher::Handler(Box::new(Xor { key: 0 })))
        }
    }

    /// Stores lowercase, reads uppercase, ignores `skip`.
    #[derive(Debug)]
    struct Shout;
    impl ValueTransform for Shout {
        fn to_datasource(&self, _member: &MemberDefinition, value: Value) -> Result<Value> {
            Ok(match value {
                Value::Varchar(Some(v)) => Value::Varchar(Some(v.to_lowercase())),
                v => v,
            })
        }
        fn from_datasource(&self, _member: &MemberDefinition, value: Value) -> Result<Transformed> {
            Ok(match value {
                Value::Varchar(Some(v)) if v == "skip" => Transformed::Ignore,
                Value::Varchar(Some(v)) => Transformed::Value(Value::Varchar(Some(v.to_uppercase()))),
                v => Transformed::Value(v),
            })
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Account {
        id: i64,
        owner: String,
        balance: Option<Decimal>,
        ssn: String,
        nickname: String,
        status: i32,
    }

    impl Contract for Account {
        fn describe() -> TypeDescription {
            TypeDescription::new("Account")
                .member(
                    MemberInfo::field::<String>("ssn")
                        .with(MemberAttribute::Behavior(Behavior::secure_with("pii", "id"))),
                )
                .member(MemberInfo::field::<i64>("id"))
                .member(MemberInfo::field::<String>("owner").with(MemberAttribute::Rename("owner_name")))
                .member(MemberInfo::field::<Option<Decimal>>("balance"))
                .member(
                    MemberInfo::field::<String>("nickname")
                        .with(MemberAttribute::Behavior(Behavior::transform(Shout))),
                )
                .member(MemberInfo::field::<i32>("status").write_only())
        }
        fn get_member(&self, ident: &str) -> Option<Value> {
            Some(match ident {
                "id" => self.id.as_value(),
                "owner" => self.owner.clone().as_value(),
                "balance" => self.balance.as_value(),
                "ssn" => self.ssn.clone().as_value(),
                "nickname" => self.nickname.clone().as_value(),
                _ => return None,
            })
        }
        fn set_member(&mut self, ident: &str, value: Value) -> Result<()> {
            match ident {
                "id" => self.id = AsValue::try_from_value(value)?,
                "owner" => self.owner = AsValue::try_from_value(value)?,
                "balance" => self.balance = AsValue::try_from_value(value)?,
                "ssn" => self.ssn = AsValue::try_from_value(value)?,
                "nickname" => self.nickname = AsValue::try_from_value(value)?,
                "status" => self.status = AsValue::try_from_value(value)?,
                _ => return Err(unknown_member("Account", ident)),
            }
            Ok(())
        }
        fn create_default() -> Option<Self> {
            Some(Default::default())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: Option<String>,
    }

    impl Contract for Point {
        fn describe() -> TypeDescription {
            TypeDescription::new("Point")
                .member(MemberInfo::field::<i32>("x").read_only())
                .member(MemberInfo::field::<i32>("y").read_only())
                .member(MemberInfo::field::<Option<String>>("label").read_only())
                .record(["x", "y", "label"])
        }
        fn get_member(&self, ident: &str) -> Option<Value> {
            Some(match ident {
                "x" => self.x.as_value(),
                "y" => self.y.as_value(),
                "label" => self.label.clone().as_value(),
                _ => return None,
            })
        }
        fn set_member(&mut self, ident: &str, _value: Value) -> Result<()> {
            Err(unknown_member("Point", ident))
        }
        fn create_record(values: Vec<Value>) -> Result<Self> {
            let mut values = values.into_iter();
            Ok(Self {
                x: AsValue::try_from_value(values.next().unwrap_or_default())?,
                y: AsValue::try_from_value(values.next().unwrap_or_default())?,
                label: AsValue::try_from_value(values.next().unwrap_or_default())?,
            })
        }
    }

    /// Neither a default nor a record constructor.
    #[derive(Debug)]
    struct Sealed {
        _id: i32,
    }

    impl Contract for Sealed {
        fn describe() -> TypeDescription {
            TypeDescription::new("Sealed").member(MemberInfo::field::<i32>("id"))
        }
        fn get_member(&self, _ident: &str) -> Option<Value> {
            None
        }
        fn set_member(&mut self, ident: &str, _value: Value) -> Result<()> {
            Err(unknown_member("Sealed", ident))
        }
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    enum Tier {
        #[default]
        Bronze = 1,
        Silver = 2,
        Platinum = 3,
    }
    impl AsValue for Tier {
        fn as_empty_value() -> Value {
            Value::Enum(None)
        }
        fn as_value(self) -> Value {
            Value::Enum(Some(EnumValue {
                type_name: "Tier",
                name: match self {
                    Tier::Bronze => "Bronze",
                    Tier::Silver => "Silver",
                    Tier::Platinum => "Platinum",
                },
                value: self as i64,
            }))
        }
        fn try_from_value(value: Value) -> Result<Self> {
            match value {
                Value::Varchar(Some(ref v)) => match v.as_str() {
                    "Bronze" => Ok(Tier::Bronze),
                    "Silver" => Ok(Tier::Silver),
                    "Platinum" => Ok(Tier::Platinum),
                    _ => Err(Error::msg(format!("Unknown tier `{v}`"))),
                },
                ref v => match v.as_i128() {
                    Some(1) => Ok(Tier::Bronze),
                    Some(2) => Ok(Tier::Silver),
                    Some(3) => Ok(Tier::Platinum),
                    _ => Err(Error::msg(format!("Cannot convert {v:?} to Tier"))),
                },
            }
        }
    }

    /// Loyalty member whose tier travels encrypted, by name.
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Member {
        id: i64,
        tier: Tier,
    }

    impl Contract for Member {
        fn describe() -> TypeDescription {
            TypeDescription::new("Member")
                .member(MemberInfo::field::<i64>("id"))
                .member(
                    MemberInfo::field::<Tier>("tier")
                        .with(MemberAttribute::Behavior(Behavior::EnumAsString))
                        .with(MemberAttribute::Behavior(Behavior::secure_with("pii", "id"))),
                )
        }
        fn get_member(&self, ident: &str) -> Option<Value> {
            Some(match ident {
                "id" => self.id.as_value(),
                "tier" => self.tier.as_value(),
                _ => return None,
            })
        }
        fn set_member(&mut self, ident: &str, value: Value) -> Result<()> {
            match ident {
                "id" => self.id = AsValue::try_from_value(value)?,
                "tier" => self.tier = AsValue::try_from_value(value)?,
                _ => return Err(unknown_member("Member", ident)),
            }
            Ok(())
        }
        fn create_default() -> Option<Self> {
            Some(Default::default())
        }
    }

    fn encrypted_ssn(plaintext: &str, id: i64) -> Value {
        let members = MemberModel::derive::<Account>().unwrap();
        let ssn = members.iter().find(|v| v.ident == "ssn").unwrap();
        ParameterEncoder::new(Settings::default().with_secure_provider(XorProvider))
            .encode(
                "Account",
                &mut ContractMemberValue::new(ssn, plaintext.to_string().as_value()),
                Some(id.as_value()),
            )
            .unwrap()
            .value
    }

    #[test]
    fn shapes() {
        init_logs();
        let shape = EntityShape::of::<Account>().unwrap();
        assert!(Arc::ptr_eq(&shape, &EntityShape::of::<Account>().unwrap()));
        assert_eq!(shape.constructor, Constructor::Default);
        assert!(!shape.is_immutable_record);
        let names = |indices: &[usize]| {
            indices
                .iter()
                .map(|i| shape.members[*i].ident)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&shape.basic_setters), ["id", "owner", "balance", "status"]);
        assert_eq!(names(&shape.deferred_setters), ["ssn", "nickname"]);
        assert!(shape.is_instantiable());
        assert!(shape.member("OWNER_NAME").is_some());

        let shape = EntityShape::of::<Point>().unwrap();
        assert_eq!(shape.constructor, Constructor::Record);
        assert!(shape.is_immutable_record);
        assert_eq!(shape.constructor_fields, [0, 1, 2]);
        assert!(shape.basic_setters.is_empty());

        let shape = EntityShape::of::<Sealed>().unwrap();
        assert_eq!(shape.constructor, Constructor::None);
        assert!(!shape.is_instantiable());
    }

    #[test]
    fn decode_default_constructed() {
        init_logs();
        let decoder = EntityDecoder::new(Settings::default().with_secure_provider(XorProvider));
        let account: Account = decoder
            .decode(&row(
                &["SSN", "ID", "Owner_Name", "balance", "nickname"],
                vec![
                    encrypted_ssn("123-45-6789", 5),
                    // Narrower than the member, the authenticator still matches
                    Value::Int32(Some(5)),
                    Value::Varchar(Some("Ada".into())),
                    Value::Decimal(None),
                    Value::Varchar(Some("countess".into())),
                ],
            ))
            .unwrap();
        assert_eq!(
            account,
            Account {
                id: 5,
                owner: "Ada".into(),
                balance: None,
                ssn: "123-45-6789".into(),
                nickname: "COUNTESS".into(),
                status: 0,
            }
        );
    }

    #[test]
    fn decode_skips_nulls_and_ignored() {
        init_logs();
        let decoder = EntityDecoder::new(Settings::default().with_secure_provider(XorProvider));
        let account: Account = decoder
            .decode(&row(
                &["id", "owner_name", "nickname", "ssn"],
                vec![
                    Value::Int64(Some(1)),
                    Value::Varchar(None),
                    Value::Varchar(Some("skip".into())),
                    Value::Blob(None),
                ],
            ))
            .unwrap();
        assert_eq!(account.id, 1);
        assert_eq!(account.owner, "");
        assert_eq!(account.nickname, "");
        assert_eq!(account.ssn, "");
    }

    #[test]
    fn decode_into_existing() {
        init_logs();
        let decoder = EntityDecoder::default();
        let mut account = Account {
            id: 9,
            owner: "Grace".into(),
            nickname: "AMAZING".into(),
            ..Default::default()
        };
        decoder
            .decode_into(
                &mut account,
                &row(
                    &["balance", "nickname"],
                    vec![
                        Value::Decimal(Some(Decimal::new(1050, 2))),
                        Value::Varchar(Some("skip".into())),
                    ],
                ),
            )
            .unwrap();
        assert_eq!(account.id, 9);
        assert_eq!(account.owner, "Grace");
        assert_eq!(account.balance, Some(Decimal::new(1050, 2)));
        assert_eq!(account.nickname, "AMAZING");
    }

    #[test]
    fn decode_record() {
        init_logs();
        let decoder = EntityDecoder::default();
        let point: Point = decoder
            .decode(&row(
                &["y", "x", "label"],
                vec![
                    Value::Int32(Some(2)),
                    Value::Int64(Some(1)),
                    Value::Varchar(Some("origin".into())),
                ],
            ))
            .unwrap();
        assert_eq!(
            point,
            Point {
                x: 1,
                y: 2,
                label: Some("origin".into()),
            }
        );
        // Missing and null arguments fall back to the zero of their type
        let point: Point = decoder
            .decode(&row(&["x", "y"], vec![Value::Int32(Some(4)), Value::Int32(None)]))
            .unwrap();
        assert_eq!(
            point,
            Point {
                x: 4,
                y: 0,
                label: None,
            }
        );
    }

    #[test]
    fn missing_constructor() {
        init_logs();
        let error = EntityDecoder::default()
            .decode::<Sealed>(&row(&["id"], vec![Value::Int32(Some(1))]))
            .unwrap_err();
        assert!(matches!(
            PhormError::of(&error),
            Some(PhormError::MissingConstructor { entity }) if entity == "Sealed"
        ));
    }

    #[test]
    fn diagnostics() {
        init_logs();
        let diagnostics = Arc::new(RecordedDiagnostics::new());
        let decoder = EntityDecoder::new(Settings::default().with_diagnostics(diagnostics.clone()));
        let account: Account = decoder
            .decode(&row(
                &["id", "extra"],
                vec![Value::Int64(Some(3)), Value::Boolean(Some(true))],
            ))
            .unwrap();
        assert_eq!(account.id, 3);
        let events = diagnostics.events();
        assert!(events.contains(&DiagnosticEvent::UnexpectedColumn {
            entity: "Account".into(),
            column: "extra".into(),
        }));
        assert!(events.contains(&DiagnosticEvent::UnresolvedMember {
            entity: "Account".into(),
            member: "owner_name".into(),
        }));
        assert!(!events.iter().any(|v| matches!(
            v,
            DiagnosticEvent::UnexpectedColumn { column, .. } if column == "id"
        )));

        // A renamed member is only bound by its wire name
        let diagnostics = Arc::new(RecordedDiagnostics::new());
        let decoder = EntityDecoder::new(Settings::default().with_diagnostics(diagnostics.clone()));
        let account: Account = decoder
            .decode(&row(
                &["id", "owner"],
                vec![Value::Int64(Some(3)), Value::Varchar(Some("Ada".into()))],
            ))
            .unwrap();
        assert_eq!(account.owner, "");
        assert!(diagnostics.events().contains(&DiagnosticEvent::UnexpectedColumn {
            entity: "Account".into(),
            column: "owner".into(),
        }));
    }

    #[test]
    fn secure_without_provider() {
        init_logs();
        let error = EntityDecoder::default()
            .decode::<Account>(&row(
                &["id", "ssn"],
                vec![Value::Int64(Some(5)), encrypted_ssn("secret", 5)],
            ))
            .unwrap_err();
        assert!(matches!(
            PhormError::of(&error),
            Some(PhormError::EncryptionUnavailable { .. })
        ));
    }

    #[test]
    fn apply_outputs() {
        init_logs();
        let decoder = EntityDecoder::default();
        let mut account = Account {
            id: 1,
            owner: "Linus".into(),
            ..Default::default()
        };
        let parameters = [
            Parameter {
                name: "id".into(),
                direction: ParameterDirection::InputOutput,
                db_type: None,
                size: None,
                value: Value::Int64(Some(77)),
            },
            Parameter {
                name: "owner_name".into(),
                direction: ParameterDirection::Input,
                db_type: None,
                size: None,
                value: Value::Varchar(Some("ignored".into())),
            },
            Parameter {
                name: "status".into(),
                direction: ParameterDirection::Output,
                db_type: None,
                size: None,
                value: Value::Int32(Some(200)),
            },
            Parameter {
                name: "@return".into(),
                direction: ParameterDirection::ReturnValue,
                db_type: None,
                size: None,
                value: Value::Int32(Some(-1)),
            },
        ];
        let returned = decoder.apply_outputs(&mut account, &parameters).unwrap();
        assert_eq!(returned, Some(Value::Int32(Some(-1))));
        assert_eq!(account.id, 77);
        assert_eq!(account.owner, "Linus");
        assert_eq!(account.status, 200);
    }

    #[test]
    fn secure_enum_as_string() {
        init_logs();
        let settings = Settings::default().with_secure_provider(XorProvider);
        // Names of 6, 8 and 6 bytes
        for tier in [Tier::Silver, Tier::Platinum, Tier::Bronze] {
            let member = Member { id: 42, tier };
            let parameters = ParameterEncoder::new(settings.clone())
                .encode_contract::<Member>(&Arguments::of(&member))
                .unwrap();
            assert!(matches!(
                &parameters[1].value,
                Value::Blob(Some(v)) if v.len() == format!("{tier:?}").len()
            ));
            let decoded: Member = EntityDecoder::new(settings.clone())
                .decode(&row(
                    &["id", "tier"],
                    vec![Value::Int64(Some(42)), parameters[1].value.clone()],
                ))
                .unwrap();
            assert_eq!(decoded, member);
        }
    }
}
