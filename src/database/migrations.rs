use sqlx::SqlitePool;

/// Ejecuta todas las migraciones (CREATE TABLE IF NOT EXISTS + seed inicial).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ═══════════════════════════════════════
    // TABLE: users
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id              INTEGER  PRIMARY KEY AUTOINCREMENT,
            name            TEXT     NOT NULL,
            email           TEXT     NOT NULL UNIQUE,
            password_hash   TEXT     NOT NULL,
            estado          INTEGER  NOT NULL DEFAULT 1,
            created_at      DATETIME DEFAULT CURRENT_TIMESTAMP,
            last_login_at   DATETIME
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: personas
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS personas (
            id               INTEGER  PRIMARY KEY AUTOINCREMENT,
            nombres          TEXT,
            apellidos        TEXT,
            razon_social     TEXT,
            telefono         TEXT,
            email            TEXT,
            tipo_documento   TEXT     NOT NULL,
            numero_documento TEXT     NOT NULL UNIQUE,
            created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // ═══════════════════════════════════════
    // TABLE: clientes
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS clientes (
            id                  INTEGER  PRIMARY KEY AUTOINCREMENT,
            persona_id          INTEGER  NOT NULL REFERENCES personas(id) ON DELETE CASCADE,
            codigo              TEXT     NOT NULL UNIQUE,
            dias_credito        INTEGER  NOT NULL DEFAULT 0,
            credito_disponible  REAL     NOT NULL DEFAULT 0,
            estado              INTEGER  NOT NULL DEFAULT 1,
            created_at          DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at          DATETIME DEFAULT CURRENT_TIMESTAMP,
            deleted_at          DATETIME
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_clientes_persona ON clientes(persona_id)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: proveedores
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS proveedores (
            id                INTEGER  PRIMARY KEY AUTOINCREMENT,
            persona_id        INTEGER  NOT NULL REFERENCES personas(id) ON DELETE CASCADE,
            codigo            TEXT     NOT NULL UNIQUE,
            tipo_proveedor    TEXT     NOT NULL CHECK(tipo_proveedor IN ('PRODUCTO', 'SERVICIO', 'AMBOS')),
            rubro             TEXT,
            limite_credito    REAL     NOT NULL DEFAULT 0,
            credito_usado     REAL     NOT NULL DEFAULT 0,
            dias_credito      INTEGER  NOT NULL DEFAULT 0,
            descuento_general REAL     NOT NULL DEFAULT 0,
            cuenta_bancaria   TEXT,
            banco             TEXT,
            nombre_contacto   TEXT,
            cargo_contacto    TEXT,
            telefono_contacto TEXT,
            email_contacto    TEXT,
            observaciones     TEXT,
            fecha_registro    TEXT,
            ultima_compra     TEXT,
            total_compras     REAL     NOT NULL DEFAULT 0,
            calificacion      INTEGER  NOT NULL DEFAULT 3,
            estado            INTEGER  NOT NULL DEFAULT 1,
            created_at        DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at        DATETIME DEFAULT CURRENT_TIMESTAMP,
            deleted_at        DATETIME
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_proveedores_persona ON proveedores(persona_id)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: categorias
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS categorias (
            id          INTEGER  PRIMARY KEY AUTOINCREMENT,
            nombre      TEXT     NOT NULL UNIQUE,
            descripcion TEXT,
            estado      INTEGER  NOT NULL DEFAULT 1,
            created_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at  DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // ═══════════════════════════════════════
    // TABLE: productos
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS productos (
            id            INTEGER  PRIMARY KEY AUTOINCREMENT,
            codigo        TEXT     NOT NULL UNIQUE,
            nombre        TEXT     NOT NULL,
            descripcion   TEXT,
            categoria_id  INTEGER  REFERENCES categorias(id) ON DELETE SET NULL,
            precio_compra REAL     NOT NULL DEFAULT 0 CHECK(precio_compra >= 0),
            precio_venta  REAL     NOT NULL CHECK(precio_venta >= 0),
            stock         INTEGER  NOT NULL DEFAULT 0 CHECK(stock >= 0),
            stock_minimo  INTEGER  NOT NULL DEFAULT 0 CHECK(stock_minimo >= 0),
            unidad_medida TEXT     NOT NULL DEFAULT 'UNIDAD',
            estado        INTEGER  NOT NULL DEFAULT 1,
            created_at    DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at    DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_productos_nombre ON productos(nombre)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_productos_categoria ON productos(categoria_id)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: ventas
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ventas (
            id                   INTEGER  PRIMARY KEY AUTOINCREMENT,
            codigo               TEXT     NOT NULL UNIQUE,
            cliente_id           INTEGER  NOT NULL REFERENCES clientes(id),
            tipo_venta           TEXT     NOT NULL CHECK(tipo_venta IN ('CONTADO', 'CREDITO')),
            tipo_comprobante     TEXT     NOT NULL CHECK(tipo_comprobante IN ('BOLETA', 'FACTURA', 'TICKET')),
            numero_comprobante   TEXT,
            fecha_venta          TEXT     NOT NULL,
            fecha_vencimiento    TEXT,
            subtotal             REAL     NOT NULL DEFAULT 0,
            porcentaje_impuesto  REAL     NOT NULL DEFAULT 0,
            impuesto             REAL     NOT NULL DEFAULT 0,
            porcentaje_descuento REAL     NOT NULL DEFAULT 0,
            descuento            REAL     NOT NULL DEFAULT 0,
            total                REAL     NOT NULL DEFAULT 0,
            estado               TEXT     NOT NULL DEFAULT 'PENDIENTE'
                                 CHECK(estado IN ('PENDIENTE', 'PAGADA', 'ANULADA')),
            observaciones        TEXT,
            created_at           DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at           DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ventas_cliente ON ventas(cliente_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ventas_fecha ON ventas(fecha_venta)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: venta_detalles
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS venta_detalles (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            venta_id             INTEGER NOT NULL REFERENCES ventas(id) ON DELETE CASCADE,
            producto_id          INTEGER NOT NULL REFERENCES productos(id),
            cantidad             INTEGER NOT NULL CHECK(cantidad > 0),
            precio_unitario      REAL    NOT NULL,
            porcentaje_descuento REAL    NOT NULL DEFAULT 0,
            descuento            REAL    NOT NULL DEFAULT 0,
            subtotal             REAL    NOT NULL,
            total                REAL    NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_venta_detalles_venta ON venta_detalles(venta_id)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: compras
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS compras (
            id                   INTEGER  PRIMARY KEY AUTOINCREMENT,
            codigo               TEXT     NOT NULL UNIQUE,
            proveedor_id         INTEGER  NOT NULL REFERENCES proveedores(id),
            tipo_compra          TEXT     NOT NULL CHECK(tipo_compra IN ('CONTADO', 'CREDITO')),
            tipo_comprobante     TEXT     NOT NULL CHECK(tipo_comprobante IN ('BOLETA', 'FACTURA', 'TICKET')),
            numero_comprobante   TEXT,
            fecha_compra         TEXT     NOT NULL,
            fecha_vencimiento    TEXT,
            subtotal             REAL     NOT NULL DEFAULT 0,
            porcentaje_impuesto  REAL     NOT NULL DEFAULT 0,
            impuesto             REAL     NOT NULL DEFAULT 0,
            porcentaje_descuento REAL     NOT NULL DEFAULT 0,
            descuento            REAL     NOT NULL DEFAULT 0,
            total                REAL     NOT NULL DEFAULT 0,
            estado               TEXT     NOT NULL DEFAULT 'PENDIENTE'
                                 CHECK(estado IN ('PENDIENTE', 'PAGADA', 'ANULADA')),
            observaciones        TEXT,
            created_at           DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at           DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_compras_proveedor ON compras(proveedor_id)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: compra_detalles
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS compra_detalles (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            compra_id            INTEGER NOT NULL REFERENCES compras(id) ON DELETE CASCADE,
            producto_id          INTEGER NOT NULL REFERENCES productos(id),
            cantidad             INTEGER NOT NULL CHECK(cantidad > 0),
            precio_unitario      REAL    NOT NULL,
            porcentaje_descuento REAL    NOT NULL DEFAULT 0,
            descuento            REAL    NOT NULL DEFAULT 0,
            subtotal             REAL    NOT NULL,
            total                REAL    NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_compra_detalles_compra ON compra_detalles(compra_id)",
    )
    .execute(pool)
    .await?;

    // Columnas añadidas después del esquema inicial (seguro para datos existentes)
    safe_add_column(pool, "productos", "imagen", "TEXT").await;

    // Seed del primer administrador si no hay usuarios
    seed_admin_si_vacio(pool).await?;

    Ok(())
}

/// Inserta un usuario administrador inicial cuando la tabla está vacía.
async fn seed_admin_si_vacio(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if count.0 == 0 {
        let hash = bcrypt::hash("Admin1234", bcrypt::DEFAULT_COST)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

        sqlx::query(
            "INSERT INTO users (name, email, password_hash, estado) VALUES (?, ?, ?, 1)",
        )
        .bind("Administrador")
        .bind("admin@sistema.com")
        .bind(&hash)
        .execute(pool)
        .await?;

        crate::log_warn!(
            "DATABASE",
            "Usuario administrador inicial creado (admin@sistema.com); cambie el password"
        );
    }

    Ok(())
}

/// ALTER TABLE ADD COLUMN que ignora el error si la columna ya existe.
async fn safe_add_column(pool: &SqlitePool, table: &str, column: &str, col_type: &str) {
    let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, col_type);
    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => {}
        Err(e) => {
            let msg = e.to_string();
            if !msg.contains("duplicate column") {
                eprintln!("Advertencia de migración: {}", msg);
            }
        }
    }
}
