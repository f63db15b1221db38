use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_identity_tables::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_sales_table::Migration),
            Box::new(m20240101_000004_create_purchases_table::Migration),
            Box::new(m20240101_000005_create_proforma_tables::Migration),
            Box::new(m20240101_000006_create_finance_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_identity_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_identity_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::Status).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Sellers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sellers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sellers::UserId).uuid().not_null())
                        .col(ColumnDef::new(Sellers::Name).string().not_null())
                        .col(ColumnDef::new(Sellers::Email).string().not_null())
                        .col(ColumnDef::new(Sellers::Phone).string().null())
                        .col(
                            ColumnDef::new(Sellers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::UserId).uuid().not_null())
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Brands::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Brands::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Brands::UserId).uuid().not_null())
                        .col(ColumnDef::new(Brands::Name).string().not_null())
                        .col(
                            ColumnDef::new(Brands::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Brands::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sellers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        Role,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Sellers {
        Table,
        Id,
        UserId,
        Name,
        Email,
        Phone,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Categories {
        Table,
        Id,
        UserId,
        Name,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Brands {
        Table,
        Id,
        UserId,
        Name,
        CreatedAt,
    }
}

mod m20240101_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::UserId).uuid().not_null())
                        .col(ColumnDef::new(Products::SellerId).uuid().not_null())
                        .col(ColumnDef::new(Products::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(Products::BrandId).uuid().null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).string().null())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(
                            ColumnDef::new(Products::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::MeasurementType).string().null())
                        .col(ColumnDef::new(Products::MeasurementUnit).string().null())
                        .col(ColumnDef::new(Products::MeasurementValue).decimal().null())
                        .col(ColumnDef::new(Products::Images).json().not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Query-path indexes. The compound (category, price) index backs
            // filtered category browsing ordered by price.
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_name")
                        .table(Products::Table)
                        .col(Products::Name)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_seller")
                        .table(Products::Table)
                        .col(Products::SellerId)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_price")
                        .table(Products::Table)
                        .col(Products::Price)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_category_price")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .col(Products::Price)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        UserId,
        SellerId,
        CategoryId,
        BrandId,
        Name,
        Description,
        Price,
        Stock,
        MeasurementType,
        MeasurementUnit,
        MeasurementValue,
        Images,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_sales_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_sales_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sales::UserId).uuid().not_null())
                        .col(ColumnDef::new(Sales::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Sales::ProductName).string().not_null())
                        .col(ColumnDef::new(Sales::BuyerName).string().not_null())
                        .col(ColumnDef::new(Sales::Quantity).integer().not_null())
                        .col(ColumnDef::new(Sales::ProductPrice).decimal().not_null())
                        .col(ColumnDef::new(Sales::SellingPrice).decimal().not_null())
                        .col(ColumnDef::new(Sales::TotalPrice).decimal().not_null())
                        .col(ColumnDef::new(Sales::PaymentMode).string().not_null())
                        .col(
                            ColumnDef::new(Sales::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sales_user_date")
                        .table(Sales::Table)
                        .col(Sales::UserId)
                        .col(Sales::Date)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Sales {
        Table,
        Id,
        UserId,
        ProductId,
        ProductName,
        BuyerName,
        Quantity,
        ProductPrice,
        SellingPrice,
        TotalPrice,
        PaymentMode,
        Date,
        CreatedAt,
    }
}

mod m20240101_000004_create_purchases_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_purchases_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Purchases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Purchases::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Purchases::UserId).uuid().not_null())
                        .col(ColumnDef::new(Purchases::SellerId).uuid().not_null())
                        .col(ColumnDef::new(Purchases::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Purchases::SellerName).string().not_null())
                        .col(ColumnDef::new(Purchases::ProductName).string().not_null())
                        .col(ColumnDef::new(Purchases::Quantity).integer().not_null())
                        .col(ColumnDef::new(Purchases::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(Purchases::TotalPrice).decimal().not_null())
                        .col(
                            ColumnDef::new(Purchases::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Purchases::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Purchases {
        Table,
        Id,
        UserId,
        SellerId,
        ProductId,
        SellerName,
        ProductName,
        Quantity,
        UnitPrice,
        TotalPrice,
        CreatedAt,
    }
}

mod m20240101_000005_create_proforma_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_proforma_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Proformas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Proformas::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Proformas::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Proformas::BillFrom).json().not_null())
                        .col(ColumnDef::new(Proformas::BillTo).json().not_null())
                        .col(
                            ColumnDef::new(Proformas::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Proformas::DueDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Proformas::PaymentDays).integer().not_null())
                        .col(
                            ColumnDef::new(Proformas::LateFeePercentage)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Proformas::Subtotal).decimal().not_null())
                        .col(ColumnDef::new(Proformas::SalesTax).decimal().not_null())
                        .col(ColumnDef::new(Proformas::Other).decimal().not_null())
                        .col(ColumnDef::new(Proformas::Total).decimal().not_null())
                        .col(ColumnDef::new(Proformas::Status).string().not_null())
                        .col(
                            ColumnDef::new(Proformas::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Proformas::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProformaItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProformaItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProformaItems::ProformaId).uuid().not_null())
                        .col(ColumnDef::new(ProformaItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProformaItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProformaItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(ProformaItems::Price).decimal().not_null())
                        .col(ColumnDef::new(ProformaItems::Total).decimal().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_proforma_items_proforma")
                        .table(ProformaItems::Table)
                        .col(ProformaItems::ProformaId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProformaItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Proformas::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Proformas {
        Table,
        Id,
        InvoiceNumber,
        BillFrom,
        BillTo,
        Date,
        DueDate,
        PaymentDays,
        LateFeePercentage,
        Subtotal,
        SalesTax,
        Other,
        Total,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ProformaItems {
        Table,
        Id,
        ProformaId,
        ProductId,
        Description,
        Quantity,
        Price,
        Total,
    }
}

mod m20240101_000006_create_finance_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_finance_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Expenses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Expenses::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Expenses::Title).string().not_null())
                        .col(ColumnDef::new(Expenses::Amount).decimal().not_null())
                        .col(ColumnDef::new(Expenses::Description).string().null())
                        .col(
                            ColumnDef::new(Expenses::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Expenses::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(Expenses::Status).string().not_null())
                        .col(
                            ColumnDef::new(Expenses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Expenses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(credit_like_table(Credits::Table, Credits::CreditAmount))
                .await?;
            manager
                .create_table(credit_like_table(Debits::Table, Debits::DebitAmount))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Debits::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Credits::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Expenses::Table).to_owned())
                .await
        }
    }

    /// Credits and debits share their shape apart from the financed-amount
    /// column name.
    fn credit_like_table<T, C>(table: T, amount_col: C) -> TableCreateStatement
    where
        T: Iden + 'static,
        C: Iden + 'static,
    {
        Table::create()
            .table(table)
            .if_not_exists()
            .col(ColumnDef::new(Shared::Id).uuid().primary_key().not_null())
            .col(ColumnDef::new(Shared::ProductRef).string().not_null())
            .col(ColumnDef::new(Shared::TotalAmount).decimal().not_null())
            .col(ColumnDef::new(Shared::DownPayment).decimal().not_null())
            .col(ColumnDef::new(amount_col).decimal().not_null())
            .col(ColumnDef::new(Shared::CustomerName).string().not_null())
            .col(ColumnDef::new(Shared::CustomerPhone).string().not_null())
            .col(ColumnDef::new(Shared::CustomerEmail).string().not_null())
            .col(
                ColumnDef::new(Shared::PaymentDueDate)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(ColumnDef::new(Shared::Status).string().not_null())
            .col(
                ColumnDef::new(Shared::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(Shared::UpdatedAt)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .to_owned()
    }

    #[derive(Iden)]
    enum Expenses {
        Table,
        Id,
        Title,
        Amount,
        Description,
        Date,
        CreatedBy,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Credits {
        Table,
        CreditAmount,
    }

    #[derive(Iden)]
    enum Debits {
        Table,
        DebitAmount,
    }

    #[derive(Iden)]
    enum Shared {
        Id,
        ProductRef,
        TotalAmount,
        DownPayment,
        CustomerName,
        CustomerPhone,
        CustomerEmail,
        PaymentDueDate,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}
